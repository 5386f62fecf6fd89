//! Warning types for non-fatal problems while decoding compiler output.
//!
//! A single garbage line must never cost the rest of an invocation's
//! results, so [`decode_lines`](crate::decode_lines) reports bad lines as
//! [`Warning`] values and keeps going.
//!
//! # Examples
//!
//! ```
//! use pawn_records::warning::{Warning, WarningCollector};
//!
//! let mut collector = WarningCollector::new();
//!
//! collector.add(Warning::MalformedRecord {
//!     line_number: 5,
//!     error: "unexpected end of input".to_string(),
//! });
//!
//! collector.add(Warning::UnknownKind {
//!     line_number: 10,
//!     kind: "macros".to_string(),
//! });
//!
//! let warnings = collector.into_warnings();
//! assert_eq!(warnings.len(), 2);
//! ```

/// A non-fatal warning produced while decoding report records.
///
/// Every variant carries the 1-based line number of the offending line
/// within the invocation's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A line could not be decoded as a report record.
    ///
    /// Covers both invalid JSON and JSON whose payload does not match the
    /// shape its `kind` requires.
    MalformedRecord {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the decoding error.
        error: String,
    },

    /// A well-formed record carried a `kind` the decoder does not know.
    UnknownKind {
        /// The 1-based line number of the record.
        line_number: usize,
        /// The unrecognized discriminator.
        kind: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use pawn_records::warning::Warning;
    ///
    /// let warning = Warning::MalformedRecord {
    ///     line_number: 42,
    ///     error: "unexpected token".to_string(),
    /// };
    /// assert_eq!(warning.line_number(), 42);
    /// ```
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedRecord { line_number, .. } | Self::UnknownKind { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MalformedRecord { line_number, error } => {
                format!("line {line_number}: malformed record: {error}")
            }
            Self::UnknownKind { line_number, kind } => {
                format!("line {line_number}: unknown record kind '{kind}'")
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use pawn_records::warning::Warning;
    ///
    /// let warning = Warning::UnknownKind {
    ///     line_number: 5,
    ///     kind: "macros".to_string(),
    /// };
    /// assert_eq!(warning.kind(), "unknown_kind");
    /// ```
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRecord { .. } => "malformed_record",
            Self::UnknownKind { .. } => "unknown_kind",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Warning {}

/// Accumulates warnings in line order while one output is decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningCollector {
    warnings: Vec<Warning>,
}

impl WarningCollector {
    /// Creates a new empty `WarningCollector`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning to the collector.
    pub fn add(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Returns the number of warnings collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Returns `true` if no warnings have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consumes the collector and returns all collected warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod warning_tests {
        use super::*;

        #[test]
        fn description_formats_malformed_record() {
            let warning = Warning::MalformedRecord {
                line_number: 5,
                error: "unexpected end of input".to_string(),
            };

            let desc = warning.description();
            assert!(desc.contains("line 5"));
            assert!(desc.contains("malformed record"));
            assert!(desc.contains("unexpected end of input"));
        }

        #[test]
        fn description_names_unknown_kind() {
            let warning = Warning::UnknownKind {
                line_number: 3,
                kind: "pragmas".to_string(),
            };

            assert_eq!(warning.description(), "line 3: unknown record kind 'pragmas'");
            assert_eq!(warning.line_number(), 3);
        }

        #[test]
        fn display_matches_description() {
            let warning = Warning::MalformedRecord {
                line_number: 1,
                error: "test error".to_string(),
            };

            assert_eq!(format!("{warning}"), warning.description());
        }

        #[test]
        fn kind_enables_filtering_by_type() {
            let warnings = [
                Warning::MalformedRecord {
                    line_number: 1,
                    error: "error1".to_string(),
                },
                Warning::UnknownKind {
                    line_number: 2,
                    kind: "x".to_string(),
                },
                Warning::MalformedRecord {
                    line_number: 3,
                    error: "error2".to_string(),
                },
            ];

            let malformed = warnings
                .iter()
                .filter(|w| w.kind() == "malformed_record")
                .count();
            assert_eq!(malformed, 2);
        }
    }

    mod collector_tests {
        use super::*;

        #[test]
        fn new_creates_empty_collector() {
            let collector = WarningCollector::new();
            assert!(collector.is_empty());
            assert_eq!(collector.len(), 0);
        }

        #[test]
        fn into_warnings_preserves_order() {
            let mut collector = WarningCollector::new();

            for i in 1..=10 {
                collector.add(Warning::MalformedRecord {
                    line_number: i,
                    error: format!("error{i}"),
                });
            }
            assert_eq!(collector.len(), 10);

            let warnings = collector.into_warnings();

            for (i, warning) in warnings.iter().enumerate() {
                assert_eq!(warning.line_number(), i + 1);
            }
        }
    }
}
