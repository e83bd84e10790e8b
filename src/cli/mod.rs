//! CLI support for cohql
//!
//! Provides programmatic access to the cohql CLI so other tools can embed
//! the same check/parse behaviour.

mod check;
mod convert;

pub use check::{CheckOptions, CheckResult, execute_check, parse_bindings, parse_named_bindings, parse_term};
pub use convert::{json_to_value, result_to_json, value_to_json};

use std::io;

use thiserror::Error;

use crate::error::{CompileError, ExecutionError, ParseError, QueryError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    /// Input JSON has the wrong shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Parse(e) => CliError::Parse(e),
            QueryError::Compile(e) => CliError::Compile(e),
            QueryError::Execution(e) => CliError::Execution(e),
        }
    }
}
