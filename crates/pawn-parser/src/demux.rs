//! Routes decoded report records to their sinks.

use crate::sink::{DiagnosticLog, SymbolKind, SymbolTable};
use pawn_records::{ParsedRecord, Warning, decode_lines};
use tracing::{debug, warn};

/// Everything one invocation's report produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Demultiplexed {
    /// Declarations, finalized.
    pub symbols: SymbolTable,
    /// Diagnostics in report order.
    pub diagnostics: DiagnosticLog,
    /// Lines that could not be decoded.
    pub warnings: Vec<Warning>,
}

/// Decodes `output` and forwards each record to the matching sink.
///
/// Malformed lines are logged and skipped. The symbol table is finalized
/// once every record has been applied.
///
/// # Examples
///
/// ```
/// use pawn_parser::{SymbolKind, demultiplex};
///
/// let output = "{\"kind\":\"functions\",\"payload\":[{\"name\":\"Foo\"}]}\n";
/// let result = demultiplex(output);
///
/// assert_eq!(result.symbols.symbols(SymbolKind::Function)[0].detail, "Foo()");
/// ```
#[must_use]
pub fn demultiplex(output: &str) -> Demultiplexed {
    let (records, warnings) = decode_lines(output);
    let mut result = Demultiplexed {
        warnings,
        ..Demultiplexed::default()
    };

    for warning in &result.warnings {
        warn!(
            line_number = warning.line_number(),
            kind = warning.kind(),
            "Skipping report line: {}",
            warning.description()
        );
    }

    for record in records {
        apply(&mut result, record);
    }
    result.symbols.finalize();

    debug!(
        symbols = result.symbols.len(),
        included_files = result.symbols.included_files().len(),
        diagnostics = result.diagnostics.len(),
        warnings = result.warnings.len(),
        "Demultiplexed report"
    );

    result
}

fn apply(result: &mut Demultiplexed, record: ParsedRecord) {
    let symbols = &mut result.symbols;
    match record {
        ParsedRecord::Diagnostic(diagnostic) => result.diagnostics.push(diagnostic),
        ParsedRecord::IncludedFiles(files) => symbols.set_included_files(files),
        ParsedRecord::Constants(list) => symbols.set_symbols(SymbolKind::Constant, list),
        ParsedRecord::Tags(list) => symbols.set_symbols(SymbolKind::Tag, list),
        ParsedRecord::Enumerators(list) => symbols.set_symbols(SymbolKind::Enumerator, list),
        ParsedRecord::Variables(list) => symbols.set_symbols(SymbolKind::Variable, list),
        ParsedRecord::Functions(list) => symbols.set_symbols(SymbolKind::Function, list),
        ParsedRecord::Substitutes(list) => symbols.set_symbols(SymbolKind::Substitute, list),
    }
}
