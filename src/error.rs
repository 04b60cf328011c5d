use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Stage errors
// ---------------------------------------------------------------------------

/// An input file could not be found, opened or parsed as a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no input files given")]
    NoInputs,

    #[error("input file {path} does not exist")]
    Missing { path: PathBuf },

    #[error("unsupported file extension for {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// A column the pipeline relies on is absent or holds the wrong kind of data.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("column '{column}', row {row}: expected a number, found {found}")]
    NotNumeric {
        column: String,
        row: usize,
        found: String,
    },

    #[error("column '{column}', row {row}: expected an integer code, found {found}")]
    NotInteger {
        column: String,
        row: usize,
        found: String,
    },

    #[error("tables have different columns: {left:?} vs {right:?}")]
    Mismatch {
        left: Vec<String>,
        right: Vec<String>,
    },

    #[error("column '{column}' has {got} values, table has {expected} rows")]
    Length {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("at least one grouping column is required")]
    NoGroupColumns,
}

/// Equalisation was asked for on a table with no groups at all.
#[derive(Debug, Error)]
#[error("no rows found for grouping columns {columns:?}")]
pub struct EmptyGroupError {
    pub columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Umbrella error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    EmptyGroup(#[from] EmptyGroupError),

    /// Transformed and excluded halves no longer line up row for row.
    #[error("row mismatch while reassembling table: {transformed} transformed rows vs {excluded} excluded rows")]
    RowMismatch { transformed: usize, excluded: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("classifier error: {0}")]
    Model(String),

    #[error("model artifact error: {0}")]
    Artifact(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
