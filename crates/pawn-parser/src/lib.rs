//! Parser-context lifecycle and workspace routing for Pawn editor tooling.
//!
//! The Pawn compiler is the only authority on what a script declares. This
//! crate runs it in report mode and keeps the answers:
//!
//! - [`ParserRegistry`] maps every file to the context that owns it. Files
//!   that belong to a workspace (its main file or anything the main file
//!   includes) share the workspace's context; everything else gets a
//!   standalone context of its own.
//! - [`ParserContext`] runs at most one compiler invocation at a time,
//!   publishes the resulting [`SymbolTable`] and [`DiagnosticLog`], and
//!   wakes callers waiting on [`ParserContext::wait_for_result`].
//! - [`oracle`] abstracts the compiler process so contexts can be driven by
//!   `pawncc` or by recorded output.
//!
//! Once a workspace finishes parsing, standalone contexts whose files turn
//! out to be included by a workspace are collected.

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod context;
pub mod demux;
pub mod error;
pub mod oracle;
pub mod registry;
pub mod sink;
pub mod workspace;

pub use config::{CompilerSettings, ParserConfig};
pub use context::{CompletionListener, ContextSettings, ContextStatus, ParserContext};
pub use demux::{Demultiplexed, demultiplex};
pub use error::{Error, Result};
pub use registry::ParserRegistry;
pub use sink::{DiagnosticLog, SymbolKind, SymbolTable};
pub use workspace::{WorkspaceDescriptor, default_main_file};
