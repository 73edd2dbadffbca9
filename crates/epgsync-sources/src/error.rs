use std::path::PathBuf;
use thiserror::Error;

/// Failures reading the playlist source or the catalog tree.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog root {0} does not exist or is not a directory")]
    CatalogRootMissing(PathBuf),

    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid playlist source: {0}")]
    InvalidSource(String),
}

/// Why a single catalog document was skipped.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unreadable: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("document has no root element")]
    Empty,

    #[error("failed to render document: {0}")]
    Write(String),
}
