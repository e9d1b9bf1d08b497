//! Builder core for the ckan-devstaller installer.
//!
//! This crate ties the schema layer together into the `ConfigStore`, the
//! single owner of a builder session's selection, which keeps the dependency
//! closure intact across every mutation. The compiler turns a selection into
//! the canonical `ckan-devstaller` invocation, and the parser reads such an
//! invocation back.

pub mod compile;
pub mod parse;
pub mod plan;
pub mod store;

pub use compile::{
    compile, CommandLine, CompileOptions, FlagGroup, Group, BOOTSTRAP_SCRIPT, FLAG_ORDER,
    LINE_CONTINUATION, PROGRAM,
};
pub use parse::{parse_command, ParseError, ParsedCommand};
pub use plan::{describe_plan, PLAN_HEADER};
pub use store::{transition, Action, ConfigStore, SelectionMode, Snapshot};

use devstaller_schema::{OptionId, OptionKind};
use thiserror::Error;

/// Rejections reported by the store. A rejected action leaves the session
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("unknown preset '{name}'")]
    UnknownPreset { name: String },
    #[error("cannot remove the {required} {kind} because the {blocking} {kind} depends on it")]
    DependencyConflict {
        kind: OptionKind,
        blocking: OptionId,
        required: OptionId,
    },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("builder file error: {0}")]
    Manifest(#[from] devstaller_schema::ManifestError),
    #[error("builder error: {0}")]
    Builder(#[from] BuilderError),
    #[error("command parse error: {0}")]
    Parse(#[from] ParseError),
}
