//! Typed report records.
//!
//! Every line of report output is an object of the form
//! `{"kind": "<discriminator>", "payload": <value>}`. [`ParsedRecord`] is the
//! closed set of kinds the decoder accepts; payload types are lenient and
//! keep unknown fields in an `extra` map so nothing the compiler reports is
//! silently lost.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Discriminator of a report record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A single compiler diagnostic.
    Diagnostic,
    /// The list of files pulled in through `#include`.
    IncludedFiles,
    /// Named constants.
    Constants,
    /// Tag names (`Float:`, `bool:`, user tags).
    Tags,
    /// Enumerator members.
    Enumerators,
    /// Global variables.
    Variables,
    /// Functions, natives and forwards.
    Functions,
    /// Macro-like `#define` substitutions.
    Substitutes,
}

impl RecordKind {
    /// All kinds, in the order the compiler usually emits them.
    pub const ALL: [RecordKind; 8] = [
        Self::Diagnostic,
        Self::IncludedFiles,
        Self::Constants,
        Self::Tags,
        Self::Enumerators,
        Self::Variables,
        Self::Functions,
        Self::Substitutes,
    ];

    /// The wire discriminator for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diagnostic => "diagnostic",
            Self::IncludedFiles => "includedFiles",
            Self::Constants => "constants",
            Self::Tags => "tags",
            Self::Enumerators => "enumerators",
            Self::Variables => "variables",
            Self::Functions => "functions",
            Self::Substitutes => "substitutes",
        }
    }

    /// Looks up a kind by its wire discriminator.
    ///
    /// ```
    /// use pawn_records::RecordKind;
    ///
    /// assert_eq!(RecordKind::from_discriminator("tags"), Some(RecordKind::Tags));
    /// assert_eq!(RecordKind::from_discriminator("Tags"), None);
    /// ```
    #[must_use]
    pub fn from_discriminator(discriminator: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == discriminator)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded line of report output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    /// A single diagnostic.
    Diagnostic(Diagnostic),
    /// Every file the compiled unit includes.
    IncludedFiles(Vec<IncludedFile>),
    /// Constants.
    Constants(Vec<Symbol>),
    /// Tags.
    Tags(Vec<Symbol>),
    /// Enumerators.
    Enumerators(Vec<Symbol>),
    /// Variables.
    Variables(Vec<Symbol>),
    /// Functions.
    Functions(Vec<Symbol>),
    /// Substitutes.
    Substitutes(Vec<Symbol>),
}

impl ParsedRecord {
    /// Returns the discriminator of this record.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Diagnostic(_) => RecordKind::Diagnostic,
            Self::IncludedFiles(_) => RecordKind::IncludedFiles,
            Self::Constants(_) => RecordKind::Constants,
            Self::Tags(_) => RecordKind::Tags,
            Self::Enumerators(_) => RecordKind::Enumerators,
            Self::Variables(_) => RecordKind::Variables,
            Self::Functions(_) => RecordKind::Functions,
            Self::Substitutes(_) => RecordKind::Substitutes,
        }
    }

    /// Decodes a payload for the given kind.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the payload does not have the shape `kind`
    /// requires.
    pub fn from_payload(kind: RecordKind, payload: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            RecordKind::Diagnostic => Self::Diagnostic(serde_json::from_value(payload)?),
            RecordKind::IncludedFiles => Self::IncludedFiles(serde_json::from_value(payload)?),
            RecordKind::Constants => Self::Constants(serde_json::from_value(payload)?),
            RecordKind::Tags => Self::Tags(serde_json::from_value(payload)?),
            RecordKind::Enumerators => Self::Enumerators(serde_json::from_value(payload)?),
            RecordKind::Variables => Self::Variables(serde_json::from_value(payload)?),
            RecordKind::Functions => Self::Functions(serde_json::from_value(payload)?),
            RecordKind::Substitutes => Self::Substitutes(serde_json::from_value(payload)?),
        })
    }
}

/// A compiler diagnostic (error, warning or fatal).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source file the diagnostic points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// 1-based line in `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Severity as reported (`error`, `warning`, `fatal`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Compiler diagnostic number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Diagnostic text.
    #[serde(default)]
    pub message: String,
    /// Fields this decoder does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A file included by the compiled unit.
///
/// Accepts either a bare path string or an object with a `file_path` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "IncludedFileRepr")]
pub struct IncludedFile {
    /// Absolute path of the included file.
    pub file_path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncludedFileRepr {
    Path(PathBuf),
    Object { file_path: PathBuf },
}

impl From<IncludedFileRepr> for IncludedFile {
    fn from(repr: IncludedFileRepr) -> Self {
        match repr {
            IncludedFileRepr::Path(file_path) | IncludedFileRepr::Object { file_path } => {
                Self { file_path }
            }
        }
    }
}

/// A named symbol: constant, tag, enumerator, variable, function or
/// substitute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Symbol {
    /// Symbol name.
    pub name: String,
    /// Tag of the symbol's value or return type (`Float`, `bool`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// File that declares the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// 1-based declaration line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Constant value, substitution body, or similar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Function parameters, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<SymbolParameter>,
    /// Human-readable summary, composed when the symbol table is finalized.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Fields this decoder does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Symbol {
    /// Creates a symbol with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One function parameter.
///
/// Accepts either a bare name string or an object with `name` and `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ParameterRepr")]
pub struct SymbolParameter {
    /// Parameter name, including any `&` or `...` decoration.
    pub name: String,
    /// Parameter tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParameterRepr {
    Name(String),
    Object {
        name: String,
        #[serde(default)]
        tag: Option<String>,
    },
}

impl From<ParameterRepr> for SymbolParameter {
    fn from(repr: ParameterRepr) -> Self {
        match repr {
            ParameterRepr::Name(name) => Self { name, tag: None },
            ParameterRepr::Object { name, tag } => Self { name, tag },
        }
    }
}
