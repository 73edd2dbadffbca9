use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::match_result::MatchResult;

/// Bump when the on-disk layout of [`CacheRecord`] changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// What a cached match result was computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheKey {
    pub playlist_source: String,
    pub catalog_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheRecord {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub key: CacheKey,
    #[serde(flatten)]
    pub result: MatchResult,
}

impl CacheRecord {
    pub fn new(key: CacheKey, result: MatchResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            timestamp,
            key,
            result,
        }
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }
}
