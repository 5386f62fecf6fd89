//! Destinations for decoded report records.
//!
//! A [`SymbolTable`] holds the declarations of one compiled unit, grouped by
//! category. Each category is replaced wholesale by the record that carries
//! it. A [`DiagnosticLog`] accumulates one entry per diagnostic record.

use pawn_records::{Diagnostic, IncludedFile, Symbol, SymbolParameter};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Category of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// `const` declarations.
    Constant,
    /// Tag names.
    Tag,
    /// Enumerators.
    Enumerator,
    /// Global variables.
    Variable,
    /// Functions, natives and publics.
    Function,
    /// `#define` substitutions.
    Substitute,
}

impl SymbolKind {
    /// All categories, in table order.
    pub const ALL: [SymbolKind; 6] = [
        Self::Constant,
        Self::Tag,
        Self::Enumerator,
        Self::Variable,
        Self::Function,
        Self::Substitute,
    ];
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constant => "constant",
            Self::Tag => "tag",
            Self::Enumerator => "enumerator",
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Substitute => "substitute",
        };
        f.write_str(name)
    }
}

/// Declarations reported for one compiled unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolTable {
    included_files: Vec<IncludedFile>,
    constants: Vec<Symbol>,
    tags: Vec<Symbol>,
    enumerators: Vec<Symbol>,
    variables: Vec<Symbol>,
    functions: Vec<Symbol>,
    substitutes: Vec<Symbol>,
}

impl SymbolTable {
    /// Replaces the list of included files.
    pub fn set_included_files(&mut self, files: Vec<IncludedFile>) {
        self.included_files = files;
    }

    /// Replaces every symbol of `kind`.
    pub fn set_symbols(&mut self, kind: SymbolKind, symbols: Vec<Symbol>) {
        *self.category_mut(kind) = symbols;
    }

    /// Files the compiled unit included, in report order.
    #[must_use]
    pub fn included_files(&self) -> &[IncludedFile] {
        &self.included_files
    }

    /// Returns `true` if `path` is one of the included files.
    #[must_use]
    pub fn includes(&self, path: &Path) -> bool {
        self.included_files.iter().any(|f| f.file_path == path)
    }

    /// Symbols of `kind`, in report order.
    #[must_use]
    pub fn symbols(&self, kind: SymbolKind) -> &[Symbol] {
        match kind {
            SymbolKind::Constant => &self.constants,
            SymbolKind::Tag => &self.tags,
            SymbolKind::Enumerator => &self.enumerators,
            SymbolKind::Variable => &self.variables,
            SymbolKind::Function => &self.functions,
            SymbolKind::Substitute => &self.substitutes,
        }
    }

    /// Every symbol with its category, category by category.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolKind, &Symbol)> {
        SymbolKind::ALL
            .into_iter()
            .flat_map(move |kind| self.symbols(kind).iter().map(move |s| (kind, s)))
    }

    /// First symbol called `name`, searching categories in table order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<(SymbolKind, &Symbol)> {
        self.iter().find(|(_, symbol)| symbol.name == name)
    }

    /// Total number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        SymbolKind::ALL
            .into_iter()
            .map(|kind| self.symbols(kind).len())
            .sum()
    }

    /// Returns `true` if there are neither symbols nor included files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.included_files.is_empty() && self.len() == 0
    }

    /// Fills in each symbol's `detail` with a one-line declaration summary,
    /// for example `Float:Foo(a, Float:b)`.
    ///
    /// Details already supplied by the compiler are kept.
    pub fn finalize(&mut self) {
        for kind in SymbolKind::ALL {
            for symbol in self.category_mut(kind) {
                if symbol.detail.is_empty() {
                    symbol.detail = describe(kind, symbol);
                }
            }
        }
    }

    fn category_mut(&mut self, kind: SymbolKind) -> &mut Vec<Symbol> {
        match kind {
            SymbolKind::Constant => &mut self.constants,
            SymbolKind::Tag => &mut self.tags,
            SymbolKind::Enumerator => &mut self.enumerators,
            SymbolKind::Variable => &mut self.variables,
            SymbolKind::Function => &mut self.functions,
            SymbolKind::Substitute => &mut self.substitutes,
        }
    }
}

fn tagged(tag: Option<&str>, name: &str) -> String {
    match tag {
        Some(tag) if !tag.is_empty() && tag != "_" => format!("{tag}:{name}"),
        _ => name.to_string(),
    }
}

fn parameter(param: &SymbolParameter) -> String {
    tagged(param.tag.as_deref(), &param.name)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn describe(kind: SymbolKind, symbol: &Symbol) -> String {
    let name = tagged(symbol.tag.as_deref(), &symbol.name);
    let value = symbol.value.as_ref().map(value_text);

    match kind {
        SymbolKind::Function => {
            let params: Vec<String> = symbol.parameters.iter().map(parameter).collect();
            format!("{name}({})", params.join(", "))
        }
        SymbolKind::Constant => match value {
            Some(value) => format!("const {name} = {value}"),
            None => format!("const {name}"),
        },
        SymbolKind::Substitute => match value {
            Some(value) => format!("#define {} {value}", symbol.name),
            None => format!("#define {}", symbol.name),
        },
        SymbolKind::Tag => format!("{}:", symbol.name),
        SymbolKind::Enumerator | SymbolKind::Variable => name,
    }
}

/// Diagnostics reported for one compiled unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    /// Replaces every entry.
    pub fn set_diagnostics(&mut self, diagnostics: Vec<Diagnostic>) {
        self.entries = diagnostics;
    }

    /// Appends one entry.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Entries in report order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of entries with `severity` (case-insensitive).
    #[must_use]
    pub fn count_severity(&self, severity: &str) -> usize {
        self.entries
            .iter()
            .filter(|d| {
                d.severity
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(severity))
            })
            .count()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
