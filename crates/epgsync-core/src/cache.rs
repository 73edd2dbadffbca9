use chrono::{DateTime, Duration, Utc};
use epgsync_models::{CacheKey, CacheRecord, MatchResult, CACHE_FORMAT_VERSION};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use crate::error::CoreError;

/// Persisted match results with an age limit.
///
/// Any problem reading the cache is a miss; callers then redo the full match.
#[derive(Debug, Clone)]
pub struct MatchCache {
    cache_path: PathBuf,
    max_age: Duration,
}

impl MatchCache {
    pub fn new(cache_path: PathBuf, max_age: Duration) -> Self {
        Self { cache_path, max_age }
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn cache_exists(&self) -> bool {
        self.cache_path.exists()
    }

    pub fn load(&self, key: &CacheKey) -> Option<MatchResult> {
        self.load_at(key, Utc::now())
    }

    pub fn load_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<MatchResult> {
        let record = self.read_record()?;

        if record.version != CACHE_FORMAT_VERSION {
            info!(
                "Match cache format v{} does not match v{}, refreshing",
                record.version, CACHE_FORMAT_VERSION
            );
            return None;
        }

        if &record.key != key {
            info!(
                "Match cache was built from {} / {}, refreshing",
                record.key.playlist_source, record.key.catalog_root
            );
            return None;
        }

        let age = record.age_at(now);
        if age < Duration::zero() {
            debug!("Match cache timestamp {} is ahead of the clock", record.timestamp);
        }
        if age > self.max_age {
            info!("Match cache is {} old, refreshing...", format_age(age));
            return None;
        }

        if !record.result.is_consistent() {
            warn!("Match cache entries are inconsistent, refreshing");
            return None;
        }

        info!(
            "Loaded match cache ({} old, {} channels)",
            format_age(age),
            record.result.matched_count()
        );
        Some(record.result)
    }

    /// Read the record without freshness checks; `None` when absent or unreadable.
    pub fn read_record(&self) -> Option<CacheRecord> {
        if !self.cache_path.exists() {
            debug!("Cache miss: {:?} does not exist", self.cache_path);
            return None;
        }

        let content = match std::fs::read_to_string(&self.cache_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read match cache {:?}: {}", self.cache_path, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheRecord>(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to load match cache {:?}: {}", self.cache_path, e);
                None
            }
        }
    }

    /// Age of the stored record, if one can be read.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.read_record().map(|record| record.age_at(now))
    }

    pub fn save(&self, key: &CacheKey, result: &MatchResult) -> Result<(), CoreError> {
        self.save_at(key, result, Utc::now())
    }

    pub fn save_at(&self, key: &CacheKey, result: &MatchResult, now: DateTime<Utc>) -> Result<(), CoreError> {
        let record = CacheRecord::new(key.clone(), result.clone(), now);
        let json = serde_json::to_string_pretty(&record)?;

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::write(parent, e))?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.cache_path.with_extension("tmp");
        std::fs::write(&temp_path, json).map_err(|e| CoreError::write(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.cache_path).map_err(|e| CoreError::write(&self.cache_path, e))?;

        info!(
            "Match cache saved to {:?} ({} channels)",
            self.cache_path,
            result.matched_count()
        );
        Ok(())
    }

    /// Remove the cache file; returns whether one existed.
    pub fn clear(&self) -> Result<bool, CoreError> {
        if !self.cache_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.cache_path).map_err(|e| CoreError::write(&self.cache_path, e))?;
        info!("Cleared match cache {:?}", self.cache_path);
        Ok(true)
    }
}

/// Hours with one decimal, e.g. `3.5h`.
pub fn format_age(age: Duration) -> String {
    format!("{:.1}h", age.num_seconds() as f64 / 3600.0)
}
