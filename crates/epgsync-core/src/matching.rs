use epgsync_config::CatalogStrategy;
use epgsync_models::{ChannelDefinition, ChannelEntry, MatchResult};
use epgsync_sources::{IndexedCatalog, ScanningCatalog, SourceCatalog};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};
use crate::error::CoreError;

/// Keep the channels whose tvg-id has a catalog definition, in playlist order.
pub fn match_channels(channels: &[ChannelEntry], catalog: &dyn SourceCatalog) -> MatchResult {
    let start = Instant::now();
    let mut result = MatchResult::default();
    result.stats.total = channels.len();

    // Playlists often list the same feed several times under one tvg-id
    let mut lookups: HashMap<&str, Option<ChannelDefinition>> = HashMap::new();

    for channel in channels {
        let Some(tvg_id) = channel.tvg_id.as_deref() else {
            debug!("Skipped: no tvg-id ({})", channel.label());
            result.stats.skipped += 1;
            continue;
        };

        let definition = lookups
            .entry(tvg_id)
            .or_insert_with(|| catalog.find_definition(tvg_id))
            .clone();

        match definition {
            Some(definition) => {
                debug!("Matched: {} via {}", tvg_id, definition.provider);
                result.push_match(channel.clone(), definition);
            }
            None => {
                debug!("Removed: {} (no EPG source)", tvg_id);
                result.stats.removed += 1;
            }
        }
    }

    info!(
        "Matched {}/{} channels with EPG sources ({} without tvg-id, {} without EPG) in {:?}",
        result.stats.matched,
        result.stats.total,
        result.stats.skipped,
        result.stats.removed,
        start.elapsed()
    );

    result
}

/// Open the catalog under `root` using the configured lookup strategy.
pub fn open_catalog(root: &Path, strategy: CatalogStrategy) -> Result<Box<dyn SourceCatalog>, CoreError> {
    let catalog: Box<dyn SourceCatalog> = match strategy {
        CatalogStrategy::Indexed => Box::new(IndexedCatalog::build(root)?),
        CatalogStrategy::Scan => Box::new(ScanningCatalog::new(root)?),
    };
    Ok(catalog)
}

/// Match against the catalog under `root`, indexing it first.
pub fn match_against_root(channels: &[ChannelEntry], root: &Path) -> Result<MatchResult, CoreError> {
    let catalog = IndexedCatalog::build(root)?;
    Ok(match_channels(channels, &catalog))
}
