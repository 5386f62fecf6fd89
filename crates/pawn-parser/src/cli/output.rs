//! Output formatting for CLI commands.
//!
//! Text output is colored and wrapped to the terminal width; JSON output is
//! pretty-printed with `serde_json`.

use crate::context::ContextStatus;
use crate::sink::{DiagnosticLog, SymbolKind, SymbolTable};
use colored::Colorize;
use pawn_records::{Diagnostic, Symbol};
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const MIN_WRAP_WIDTH: usize = 20;

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Settings for text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Width text is wrapped to.
    pub width: usize,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Reads the terminal width and color preference.
    ///
    /// Colors are disabled by `NO_COLOR` or `PAWN_PARSER_COLOR=0`.
    #[must_use]
    pub fn from_env() -> Self {
        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("PAWN_PARSER_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            width: terminal_width(),
            use_colors,
        }
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_TERMINAL_WIDTH,
            use_colors: false,
        }
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| usize::from(w.0))
}

/// One `resolve` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The file asked about.
    pub path: PathBuf,
    /// Its context key.
    pub key: PathBuf,
}

#[derive(Serialize)]
struct SymbolEntry<'a> {
    kind: SymbolKind,
    #[serde(flatten)]
    symbol: &'a Symbol,
}

#[derive(Serialize)]
struct SymbolReport<'a> {
    context: &'a Path,
    symbols: Vec<SymbolEntry<'a>>,
}

#[derive(Serialize)]
struct DiagnosticReport<'a> {
    context: &'a Path,
    diagnostics: &'a DiagnosticLog,
}

/// Print a value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

/// Print `resolve` answers.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_resolutions<W: Write>(
    w: &mut W,
    resolutions: &[Resolution],
    mode: OutputMode,
    config: &OutputConfig,
) -> io::Result<()> {
    if mode == OutputMode::Json {
        return print_json(w, &resolutions);
    }

    for resolution in resolutions {
        let key = resolution.key.display().to_string();
        let marker = if resolution.key == resolution.path {
            config.paint("(standalone)", |s| s.dimmed())
        } else {
            config.paint("(workspace)", |s| s.green())
        };
        writeln!(
            w,
            "{} -> {} {marker}",
            resolution.path.display(),
            config.paint(&key, |s| s.cyan())
        )?;
    }
    Ok(())
}

/// Print the symbols of a context, optionally only one kind.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_symbols<W: Write>(
    w: &mut W,
    context: &Path,
    table: &SymbolTable,
    kind: Option<SymbolKind>,
    mode: OutputMode,
    config: &OutputConfig,
) -> io::Result<()> {
    let kinds: Vec<SymbolKind> = kind.map_or_else(|| SymbolKind::ALL.to_vec(), |k| vec![k]);

    if mode == OutputMode::Json {
        let symbols = kinds
            .iter()
            .flat_map(|&kind| {
                table
                    .symbols(kind)
                    .iter()
                    .map(move |symbol| SymbolEntry { kind, symbol })
            })
            .collect();
        return print_json(w, &SymbolReport { context, symbols });
    }

    let mut printed = 0;
    for kind in kinds {
        let symbols = table.symbols(kind);
        if symbols.is_empty() {
            continue;
        }
        let header = format!("{kind} ({})", symbols.len());
        writeln!(w, "{}:", config.paint(&header, |s| s.bold()))?;
        for symbol in symbols {
            print_symbol_line(w, symbol, config)?;
        }
        printed += symbols.len();
    }

    if printed == 0 {
        writeln!(w, "No symbols found.")?;
    }
    Ok(())
}

fn print_symbol_line<W: Write>(w: &mut W, symbol: &Symbol, config: &OutputConfig) -> io::Result<()> {
    let detail = if symbol.detail.is_empty() {
        symbol.name.as_str()
    } else {
        symbol.detail.as_str()
    };
    let location = match (&symbol.file, symbol.line) {
        (Some(file), Some(line)) => format!("  {}:{line}", file.display()),
        (Some(file), None) => format!("  {}", file.display()),
        _ => String::new(),
    };

    let options = textwrap::Options::new(config.width.max(MIN_WRAP_WIDTH))
        .initial_indent("  ")
        .subsequent_indent("      ");
    let lines = textwrap::wrap(detail, options);
    let last = lines.len().saturating_sub(1);
    for (index, line) in lines.iter().enumerate() {
        if index == last && !location.is_empty() {
            writeln!(w, "{line}{}", config.paint(&location, |s| s.dimmed()))?;
        } else {
            writeln!(w, "{line}")?;
        }
    }
    Ok(())
}

/// Print the diagnostics of a context.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_diagnostics<W: Write>(
    w: &mut W,
    context: &Path,
    log: &DiagnosticLog,
    mode: OutputMode,
    config: &OutputConfig,
) -> io::Result<()> {
    if mode == OutputMode::Json {
        return print_json(
            w,
            &DiagnosticReport {
                context,
                diagnostics: log,
            },
        );
    }

    if log.is_empty() {
        writeln!(w, "No diagnostics.")?;
        return Ok(());
    }

    for diagnostic in log.entries() {
        print_diagnostic(w, diagnostic, config)?;
    }
    writeln!(
        w,
        "{} error(s), {} warning(s)",
        log.count_severity("error") + log.count_severity("fatal"),
        log.count_severity("warning")
    )
}

fn print_diagnostic<W: Write>(
    w: &mut W,
    diagnostic: &Diagnostic,
    config: &OutputConfig,
) -> io::Result<()> {
    let location = match (&diagnostic.file, diagnostic.line) {
        (Some(file), Some(line)) => format!("{}:{line}: ", file.display()),
        (Some(file), None) => format!("{}: ", file.display()),
        _ => String::new(),
    };
    let severity = diagnostic.severity.as_deref().unwrap_or("note");
    let label = match diagnostic.number {
        Some(number) => format!("{severity} {number:03}"),
        None => severity.to_string(),
    };
    let label = match severity.to_ascii_lowercase().as_str() {
        "error" | "fatal" => config.paint(&label, |s| s.red().bold()),
        "warning" => config.paint(&label, |s| s.yellow()),
        _ => config.paint(&label, |s| s.cyan()),
    };

    let text = format!("{location}{label}: {}", diagnostic.message);
    let options = textwrap::Options::new(config.width.max(MIN_WRAP_WIDTH)).subsequent_indent("    ");
    for line in textwrap::wrap(&text, options) {
        writeln!(w, "{line}")?;
    }
    Ok(())
}

/// Print context statuses.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_contexts<W: Write>(
    w: &mut W,
    statuses: &[ContextStatus],
    mode: OutputMode,
    config: &OutputConfig,
) -> io::Result<()> {
    if mode == OutputMode::Json {
        return print_json(w, &statuses);
    }

    if statuses.is_empty() {
        writeln!(w, "No contexts.")?;
        return Ok(());
    }

    for status in statuses {
        let scope = if status.workspace_scoped {
            config.paint("workspace", |s| s.green())
        } else {
            config.paint("standalone", |s| s.dimmed())
        };
        let key = status.root_path.display().to_string();
        writeln!(w, "{} [{scope}]", config.paint(&key, |s| s.cyan().bold()))?;
        if let Some(main_file) = &status.main_file {
            writeln!(w, "  main file:   {main_file}")?;
        }
        writeln!(
            w,
            "  runs:        {}{}",
            status.completed_runs,
            if status.in_progress { " (running)" } else { "" }
        )?;
        if let Some(last) = status.last_completed {
            writeln!(w, "  last parsed: {}", last.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(
            w,
            "  symbols:     {}, diagnostics: {}",
            status.symbols, status.diagnostics
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawn_records::SymbolParameter;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn table() -> SymbolTable {
        let mut table = SymbolTable::default();
        let mut foo = Symbol::named("Foo");
        foo.tag = Some("Float".to_string());
        foo.parameters = vec![SymbolParameter {
            name: "a".to_string(),
            tag: None,
        }];
        foo.file = Some(PathBuf::from("/w/main.pwn"));
        foo.line = Some(12);
        table.set_symbols(SymbolKind::Function, vec![foo]);
        table.set_symbols(SymbolKind::Tag, vec![Symbol::named("Float")]);
        table.finalize();
        table
    }

    #[test]
    fn resolutions_mark_workspace_keys() {
        let resolutions = vec![
            Resolution {
                path: PathBuf::from("/w/util.inc"),
                key: PathBuf::from("/w"),
            },
            Resolution {
                path: PathBuf::from("/x/a.pwn"),
                key: PathBuf::from("/x/a.pwn"),
            },
        ];

        let text = render(|w| {
            print_resolutions(w, &resolutions, OutputMode::Text, &OutputConfig::default())
        });

        assert_eq!(
            text,
            "/w/util.inc -> /w (workspace)\n/x/a.pwn -> /x/a.pwn (standalone)\n"
        );
    }

    #[test]
    fn symbols_text_groups_by_kind() {
        let text = render(|w| {
            print_symbols(
                w,
                Path::new("/w"),
                &table(),
                None,
                OutputMode::Text,
                &OutputConfig::default(),
            )
        });

        assert_eq!(
            text,
            "tag (1):\n  Float:\nfunction (1):\n  Float:Foo(a)  /w/main.pwn:12\n"
        );
    }

    #[test]
    fn symbols_kind_filter() {
        let text = render(|w| {
            print_symbols(
                w,
                Path::new("/w"),
                &table(),
                Some(SymbolKind::Variable),
                OutputMode::Text,
                &OutputConfig::default(),
            )
        });

        assert_eq!(text, "No symbols found.\n");
    }

    #[test]
    fn symbols_json_flattens_entries() {
        let text = render(|w| {
            print_symbols(
                w,
                Path::new("/w"),
                &table(),
                Some(SymbolKind::Function),
                OutputMode::Json,
                &OutputConfig::default(),
            )
        });

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["context"], "/w");
        assert_eq!(value["symbols"][0]["kind"], "function");
        assert_eq!(value["symbols"][0]["name"], "Foo");
        assert_eq!(value["symbols"][0]["detail"], "Float:Foo(a)");
    }

    #[test]
    fn diagnostics_text_includes_location_and_summary() {
        let mut log = DiagnosticLog::default();
        log.push(Diagnostic {
            file: Some(PathBuf::from("/w/main.pwn")),
            line: Some(3),
            severity: Some("error".to_string()),
            number: Some(17),
            message: "undefined symbol \"x\"".to_string(),
            ..Diagnostic::default()
        });

        let text = render(|w| {
            print_diagnostics(w, Path::new("/w"), &log, OutputMode::Text, &OutputConfig::default())
        });

        assert_eq!(
            text,
            "/w/main.pwn:3: error 017: undefined symbol \"x\"\n1 error(s), 0 warning(s)\n"
        );
    }

    #[test]
    fn empty_diagnostics() {
        let text = render(|w| {
            print_diagnostics(
                w,
                Path::new("/w"),
                &DiagnosticLog::default(),
                OutputMode::Text,
                &OutputConfig::default(),
            )
        });

        assert_eq!(text, "No diagnostics.\n");
    }

    #[test]
    fn contexts_text_shows_scope_and_counts() {
        let statuses = vec![ContextStatus {
            root_path: PathBuf::from("/w"),
            workspace_scoped: true,
            main_file: Some("main.pwn".to_string()),
            in_progress: false,
            completed_runs: 2,
            last_completed: None,
            symbols: 5,
            diagnostics: 1,
        }];

        let text = render(|w| {
            print_contexts(w, &statuses, OutputMode::Text, &OutputConfig::default())
        });

        assert_eq!(
            text,
            "/w [workspace]\n  main file:   main.pwn\n  runs:        2\n  symbols:     5, diagnostics: 1\n"
        );
    }

    #[test]
    fn long_messages_wrap() {
        let config = OutputConfig {
            width: 30,
            use_colors: false,
        };
        let mut log = DiagnosticLog::default();
        log.push(Diagnostic {
            severity: Some("warning".to_string()),
            message: "symbol is never used and could be removed safely".to_string(),
            ..Diagnostic::default()
        });

        let text = render(|w| print_diagnostics(w, Path::new("/w"), &log, OutputMode::Text, &config));

        assert!(text.lines().count() > 2);
        assert!(text.lines().nth(1).unwrap().starts_with("    "));
    }
}
