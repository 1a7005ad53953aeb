//! m3u8-sweep: resumable batch extraction of media manifest URLs
//!
//! This crate walks a CSV table of source pages, asks a [`ManifestExtractor`]
//! for the m3u8 playlist URL embedded in each page, and writes the results back
//! into the table, checkpointing after every row so an interrupted run can
//! pick up where it stopped.

pub mod checkpoint;
pub mod config;
pub mod extractor;
pub mod runner;
pub mod table;

use thiserror::Error;

/// Main error type for m3u8-sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load table: {0}")]
    Load(#[from] LoadError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while reading the input table. These abort the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Table {path} has no '{column}' column")]
    MissingUrlColumn { path: String, column: String },
}

/// Errors raised while writing the table or checkpoint artifacts
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to replace {path}: {source}")]
    Rename {
        path: String,
        source: std::io::Error,
    },
}

/// Errors from a single extraction attempt
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid page URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for m3u8-sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extractor::{HttpManifestExtractor, ManifestExtractor};
pub use runner::{run_sweep, BatchRunner, RunSummary};
pub use table::{Row, RowSet};
