//! Error types for the query engine.
//!
//! Data-integrity problems (an image without an album, an album without a
//! root) are not errors: they are logged and the offending row is skipped.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Only SQLite stores can be opened
    #[error("unsupported database URI `{0}`: only sqlite databases are supported")]
    UnsupportedUri(String),

    /// The database file does not exist (it is never created)
    #[error("database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// The store does not look like a digiKam database
    #[error("database is missing required table `{0}`")]
    MissingTable(String),

    /// A tag or album pattern is not a valid regular expression
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
