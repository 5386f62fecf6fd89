//! CLI argument structs and value enums.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::sink::SymbolKind;

/// Arguments for the `resolve` command
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Files to resolve
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for the `symbols` command
#[derive(Parser, Debug, Clone)]
pub struct SymbolsArgs {
    /// File whose context to compile
    pub path: PathBuf,

    /// Only list symbols of this kind
    #[arg(short, long, value_enum)]
    pub kind: Option<SymbolKindArg>,
}

/// Arguments for the `diagnostics` command
#[derive(Parser, Debug, Clone)]
pub struct DiagnosticsArgs {
    /// File whose context to compile
    pub path: PathBuf,
}

/// Symbol kind for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKindArg {
    /// `const` declarations
    Constant,
    /// Tag names
    Tag,
    /// Enumerators
    Enumerator,
    /// Global variables
    Variable,
    /// Functions
    Function,
    /// `#define` substitutions
    Substitute,
}

impl From<SymbolKindArg> for SymbolKind {
    fn from(arg: SymbolKindArg) -> Self {
        match arg {
            SymbolKindArg::Constant => Self::Constant,
            SymbolKindArg::Tag => Self::Tag,
            SymbolKindArg::Enumerator => Self::Enumerator,
            SymbolKindArg::Variable => Self::Variable,
            SymbolKindArg::Function => Self::Function,
            SymbolKindArg::Substitute => Self::Substitute,
        }
    }
}
