use super::config::read_config;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use epgsync_config::Config;
use epgsync_core::{MatchCache, ReportWriter};
use std::fs;
use std::path::Path;

pub async fn run_clear(all: bool, cache: bool, outputs: bool, config_path: &Path, output: &Output) -> Result<()> {
    let config = read_config(config_path)?;

    if !(all || cache || outputs) {
        output.warn("No clear option specified. Use --cache, --outputs, or --all");
        output.println("\nExample: epgsync clear --cache");
        return Ok(());
    }

    if all || cache {
        clear_cache(&config, output)?;
    }
    if all || outputs {
        clear_outputs(&config, output)?;
    }
    if all {
        output.success("Match cache and generated outputs cleared");
    }

    Ok(())
}

fn clear_cache(config: &Config, output: &Output) -> Result<()> {
    let cache = MatchCache::new(config.cache.match_cache_file.clone(), config.cache.match_max_age());
    let removed = cache.clear().map_err(|e| eyre!("{}", e))?;
    if removed {
        output.success(format!("Cleared match cache: {}", cache.path().display()));
    } else {
        output.info("No match cache found to clear");
    }
    Ok(())
}

fn clear_outputs(config: &Config, output: &Output) -> Result<()> {
    let writer = ReportWriter::new(config.output.playlist_file.clone(), config.output.channels_file.clone());
    let mut removed = writer.remove_outputs().map_err(|e| eyre!("{}", e))?;

    let guide = &config.output.guide_file;
    if guide.is_file() {
        fs::remove_file(guide)
            .map_err(|e| eyre!("Failed to remove guide at {}: {}", guide.display(), e))?;
        removed.push(guide.clone());
    }

    if removed.is_empty() {
        output.info("No generated outputs found to clear");
    }
    for path in removed {
        output.success(format!("Removed {}", path.display()));
    }
    Ok(())
}
