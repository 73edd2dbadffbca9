use epgsync_models::MatchStats;
use epgsync_sources::{DocumentError, SourceError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Source(#[from] SourceError),

    /// No playlist channel has an EPG source; nothing useful can be written.
    #[error(
        "No channels were matched with EPG sources ({} in playlist, {} without tvg-id, {} without EPG source)",
        .stats.total, .stats.skipped, .stats.removed
    )]
    NoMatches { stats: MatchStats },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render channels document: {0}")]
    Render(#[from] DocumentError),

    #[error("Failed to serialize match cache: {0}")]
    CacheSerialize(#[from] serde_json::Error),

    #[error("EPG generation failed: {0}")]
    Generation(String),
}

impl CoreError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Write {
            path: path.into(),
            source,
        }
    }

    pub fn is_no_matches(&self) -> bool {
        matches!(self, CoreError::NoMatches { .. })
    }
}
