//! Decoder for the report records emitted by the Pawn compiler.
//!
//! When invoked with the report flag, `pawncc` writes one JSON object per
//! line to its standard output. Each object carries a `kind` discriminator
//! and a `payload`. This crate turns that byte stream into typed
//! [`ParsedRecord`] values, tolerating malformed lines by reporting them as
//! [`Warning`]s instead of failing the whole batch.
//!
//! ```
//! use pawn_records::{decode_lines, ParsedRecord};
//!
//! let output = "{\"kind\":\"functions\",\"payload\":[{\"name\":\"Foo\"}]}\nnot json\n";
//! let (records, warnings) = decode_lines(output);
//!
//! assert!(matches!(&records[0], ParsedRecord::Functions(f) if f[0].name == "Foo"));
//! assert_eq!(warnings.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod record;
pub mod warning;

pub use buffer::{LineBuffer, DEFAULT_OUTPUT_LIMIT};
pub use decode::{decode_line, decode_lines};
pub use error::{Error, Result};
pub use normalize::normalize_non_finite;
pub use record::{
    Diagnostic, IncludedFile, ParsedRecord, RecordKind, Symbol, SymbolParameter,
};
pub use warning::{Warning, WarningCollector};
