//! Execute dq queries against a source file or standard input

use std::io::{self, Read};

use super::CliError;
use crate::{
    Lexer, Parser, execute as execute_query,
    loader::{self, Format},
    output,
};

/// Source name that stands for standard input.
pub const STDIN_SOURCE: &str = "-";

/// How a successful result is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Column-aligned text table
    #[default]
    Table,
    /// Compact JSON array of objects
    Json,
    /// Indented JSON array of objects
    JsonPretty,
}

/// Options for one run of the `dq` command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The query, source file included
    pub query: String,
    /// Overrides the format inferred from the file extension
    pub format: Option<Format>,
    /// Only validate syntax, don't read or execute anything
    pub check: bool,
    pub output: OutputFormat,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed; the rendered result
    Rendered(String),
}

/// Runs a query, reading standard input when the source is `-`.
pub fn execute(options: &RunOptions) -> Result<RunOutcome, CliError> {
    execute_with_stdin(options, || {
        if atty::is(atty::Stream::Stdin) {
            return Err(CliError::InteractiveStdin);
        }
        Ok(io::stdin().lock())
    })
}

/// Like [`execute`], taking standard input from `stdin`.
///
/// `stdin` is only called when the query's source is `-`.
pub fn execute_with_stdin<R, F>(options: &RunOptions, stdin: F) -> Result<RunOutcome, CliError>
where
    R: Read,
    F: FnOnce() -> Result<R, CliError>,
{
    let query = Parser::new(Lexer::new(&options.query)).parse_query()?;

    if options.check {
        return Ok(RunOutcome::SyntaxValid);
    }

    let input = if query.source.filename == STDIN_SOURCE {
        let format = options.format.ok_or(CliError::StdinFormat)?;
        loader::load_reader(stdin()?, format)?
    } else {
        loader::load(&query.source.filename, options.format)?
    };

    let result = execute_query(&query, input)?;

    let rendered = match options.output {
        OutputFormat::Table => output::render(&result),
        OutputFormat::Json => output::to_json(&result),
        OutputFormat::JsonPretty => output::to_json_pretty(&result),
    };
    Ok(RunOutcome::Rendered(rendered))
}
