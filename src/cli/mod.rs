//! CLI support for dq
//!
//! Provides programmatic access to the `dq` command so the whole
//! parse, load, execute and render cycle can be driven and tested without
//! spawning the binary.

mod run;

pub use run::{OutputFormat, RunOptions, RunOutcome, execute, execute_with_stdin};

use thiserror::Error;

use crate::{ExecError, LoadError, ParseError};

/// Errors that can occur during a CLI run.
///
/// The display form carries the user-facing prefix (`parse error:`,
/// `load error:` or `error:`) so the binary can print it as is.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("error: {0}")]
    Exec(#[from] ExecError),

    /// `-` as source without `--format`
    #[error("load error: reading from standard input requires --format")]
    StdinFormat,

    #[error("load error: standard input is a terminal; pipe data in or name a file")]
    InteractiveStdin,
}
