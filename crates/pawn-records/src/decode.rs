//! Line-by-line decoding of report output.

use crate::error::{Error, Result};
use crate::normalize::normalize_non_finite;
use crate::record::{ParsedRecord, RecordKind};
use crate::warning::{Warning, WarningCollector};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

/// Envelope shared by every record line.
#[derive(Deserialize)]
struct RawRecord {
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Decodes a single report line.
///
/// Non-finite number tokens are normalized first (see
/// [`normalize_non_finite`]).
///
/// # Errors
///
/// - [`Error::Json`] if the line is not valid JSON, lacks a `kind`, or the
///   payload does not fit the kind
/// - [`Error::UnknownKind`] if `kind` is not a known discriminator
pub fn decode_line(line: &str) -> Result<ParsedRecord> {
    let normalized = normalize_non_finite(line);
    let raw: RawRecord = serde_json::from_str(&normalized)?;

    let kind = RecordKind::from_discriminator(&raw.kind).ok_or(Error::UnknownKind(raw.kind))?;

    Ok(ParsedRecord::from_payload(kind, raw.payload)?)
}

/// Decodes every non-empty line of `output`, independently.
///
/// Lines that fail to decode are reported as warnings and skipped; they
/// never stop later lines from being decoded. Line numbers in warnings are
/// 1-based positions in `output`, blank lines included.
#[must_use]
pub fn decode_lines(output: &str) -> (Vec<ParsedRecord>, Vec<Warning>) {
    let mut warnings = WarningCollector::new();
    let mut records = Vec::new();

    for (index, line) in output.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            continue;
        }

        match decode_line(line) {
            Ok(record) => {
                trace!(line_number, kind = %record.kind(), "Decoded report record");
                records.push(record);
            }
            Err(Error::UnknownKind(kind)) => {
                warnings.add(Warning::UnknownKind { line_number, kind });
            }
            Err(e) => {
                warnings.add(Warning::MalformedRecord {
                    line_number,
                    error: e.to_string(),
                });
            }
        }
    }

    (records, warnings.into_warnings())
}
