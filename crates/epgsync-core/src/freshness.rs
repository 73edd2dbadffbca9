use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::{debug, info};
use crate::cache::format_age;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Missing,
    Fresh(Duration),
    /// Older than the configured maximum
    Stale(Duration),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh(_))
    }

    pub fn age(&self) -> Option<Duration> {
        match self {
            Freshness::Missing => None,
            Freshness::Fresh(age) | Freshness::Stale(age) => Some(*age),
        }
    }
}

/// Age check for the generated guide, based on its modification time.
#[derive(Debug, Clone, Copy)]
pub struct GuideFreshness {
    max_age: Duration,
}

impl GuideFreshness {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn check(&self, path: &Path) -> Freshness {
        self.check_at(path, Utc::now())
    }

    pub fn check_at(&self, path: &Path, now: DateTime<Utc>) -> Freshness {
        let Some(modified) = modified_at(path) else {
            debug!("Guide {:?} not found", path);
            return Freshness::Missing;
        };

        let age = now.signed_duration_since(modified);
        if age < Duration::zero() {
            debug!("Guide {:?} has a modification time ahead of the clock", path);
        }
        if age > self.max_age {
            info!("EPG guide is {} old, regenerating", format_age(age));
            return Freshness::Stale(age);
        }
        Freshness::Fresh(age)
    }

    pub fn is_guide_fresh(&self, path: &Path) -> bool {
        self.check(path).is_fresh()
    }
}

/// Modification time of `path`, if it exists and the platform reports one.
pub fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok().map(DateTime::<Utc>::from)
}
