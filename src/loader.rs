//! # Source loading
//!
//! Turns the file named at the head of a query into the initial [`Table`].
//!
//! ## Formats
//!
//! | Format    | Extensions          | Notes                                   |
//! |-----------|---------------------|-----------------------------------------|
//! | CSV       | `.csv`              | header row, cell types inferred         |
//! | JSON      | `.json`             | top-level array of objects              |
//! | JSON Lines| `.jsonl`, `.ndjson` | one object per non-blank line           |
//! | Avro      | `.avro`             | object container file, record schema    |
//! | Parquet   | `.parquet`          | top-level schema fields become columns  |
//!
//! The extension decides the format unless a format is given explicitly.
//! Avro and Parquet support sit behind the `avro` and `parquet` features.

use std::{
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
    str::FromStr,
};

use thiserror::Error;

use crate::table::{SchemaError, Table};

#[cfg(feature = "avro")]
mod avro;
mod delimited;
mod json;
#[cfg(feature = "parquet")]
mod parquet_file;

pub use delimited::infer_value;
pub use json::json_to_value;

/// Errors raised while reading a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot parse JSON: {0} (expected an array of objects)")]
    Json(serde_json::Error),

    #[error("invalid JSON on line {line}: {source}")]
    JsonLine {
        line: usize,
        source: serde_json::Error,
    },

    #[cfg(feature = "avro")]
    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("unsupported Avro data: {0}")]
    AvroShape(String),

    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("unsupported file format {0:?} (supported: csv, json, jsonl, avro, parquet)")]
    UnsupportedFormat(String),

    #[error("{0} has no file extension; use --format")]
    MissingExtension(String),

    #[error("{0} support is not enabled in this build")]
    FormatDisabled(Format),

    #[error("{0} cannot be read from standard input")]
    StdinUnsupported(Format),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Jsonl,
    Avro,
    Parquet,
}

impl Format {
    /// Infers the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Format, LoadError> {
        let extension = match path.extension() {
            Some(ext) => ext.to_string_lossy().to_lowercase(),
            None => return Err(LoadError::MissingExtension(path.display().to_string())),
        };

        match extension.as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "jsonl" | "ndjson" => Ok(Format::Jsonl),
            "avro" => Ok(Format::Avro),
            "parquet" => Ok(Format::Parquet),
            _ => Err(LoadError::UnsupportedFormat(format!(".{extension}"))),
        }
    }
}

impl FromStr for Format {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "jsonl" | "ndjson" => Ok(Format::Jsonl),
            "avro" => Ok(Format::Avro),
            "parquet" => Ok(Format::Parquet),
            _ => Err(LoadError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Jsonl => "jsonl",
            Format::Avro => "avro",
            Format::Parquet => "parquet",
        };
        f.write_str(name)
    }
}

/// Loads `path` into a table. `format` overrides extension-based inference.
pub fn load(path: impl AsRef<Path>, format: Option<Format>) -> Result<Table, LoadError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };
    tracing::debug!(path = %path.display(), %format, "loading source");

    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let table = match format {
        #[cfg(feature = "parquet")]
        Format::Parquet => parquet_file::read(file)?,
        #[cfg(not(feature = "parquet"))]
        Format::Parquet => return Err(LoadError::FormatDisabled(Format::Parquet)),
        _ => load_reader(BufReader::new(file), format)?,
    };

    tracing::debug!(
        rows = table.len(),
        columns = table.columns.len(),
        "loaded source"
    );
    Ok(table)
}

/// Reads a table of the given format from any byte stream.
///
/// Parquet needs random access and is rejected here.
pub fn load_reader(reader: impl Read, format: Format) -> Result<Table, LoadError> {
    match format {
        Format::Csv => delimited::read(reader),
        Format::Json => json::read_array(reader),
        Format::Jsonl => json::read_lines(reader),
        #[cfg(feature = "avro")]
        Format::Avro => avro::read(reader),
        #[cfg(not(feature = "avro"))]
        Format::Avro => Err(LoadError::FormatDisabled(Format::Avro)),
        Format::Parquet => Err(LoadError::StdinUnsupported(Format::Parquet)),
    }
}
