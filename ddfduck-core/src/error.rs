//! Error types for the ddfduck conversion core.
//!
//! Uses `thiserror` for a single structured error enum. Variants are split by
//! how far they are allowed to travel: fatal setup failures abort the run,
//! everything else is caught at the unit boundary by the pipeline.

use std::path::PathBuf;

/// Top-level error type for the conversion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{tool} is required but was not found. Please install {tool}.")]
    ToolMissing { tool: String },

    #[error("Fetching source dataset failed: {message}")]
    Fetch { message: String },

    #[error("Could not open database {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Could not read concepts from {path}: {message}")]
    Concepts { path: PathBuf, message: String },

    #[error("Discovery failed: {message}")]
    Discovery { message: String },

    #[error("Materializing table '{table}' failed: {message}")]
    Materialize { table: String, message: String },

    #[error("Annotating table '{table}' failed: {message}")]
    Annotate { table: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion interrupted by user")]
    Interrupted,
}

impl ConvertError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
        }
    }

    pub fn materialize(table: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Materialize {
            table: table.into(),
            message: msg.into(),
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// Per-unit failures (one table, one file, one comment) return `false`
    /// and are recorded by the pipeline instead of propagated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::ToolMissing { .. }
                | Self::Fetch { .. }
                | Self::DatabaseOpen { .. }
                | Self::Discovery { .. }
                | Self::Interrupted
        )
    }
}

impl From<Box<figment::Error>> for ConvertError {
    fn from(err: Box<figment::Error>) -> Self {
        Self::config(err.to_string())
    }
}

/// A type alias for results using `ConvertError`.
pub type Result<T> = std::result::Result<T, ConvertError>;
