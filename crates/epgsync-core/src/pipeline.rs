use async_trait::async_trait;
use chrono::Duration;
use epgsync_config::{CatalogStrategy, Config};
use epgsync_models::{CacheKey, MatchResult, MatchStats};
use epgsync_sources::{parse_playlist_report, PlaylistLoader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use crate::cache::{format_age, MatchCache};
use crate::error::CoreError;
use crate::freshness::{Freshness, GuideFreshness};
use crate::matching::{match_channels, open_catalog};
use crate::writer::{ReportWriter, WrittenOutputs};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Ignore the match cache for this run
    pub refresh_cache: bool,
    /// Regenerate the guide even if it is fresh
    pub refresh_guide: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingCache,
    LoadingPlaylist,
    ScanningCatalog,
    Matching,
    SavingCache,
    WritingOutputs,
    GeneratingGuide,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingCache => "Checking match cache",
            RunStage::LoadingPlaylist => "Loading playlist",
            RunStage::ScanningCatalog => "Scanning EPG sources",
            RunStage::Matching => "Matching channels",
            RunStage::SavingCache => "Saving match cache",
            RunStage::WritingOutputs => "Writing outputs",
            RunStage::GeneratingGuide => "Generating EPG guide",
        }
    }
}

/// Progress notifications; every method defaults to doing nothing.
pub trait RunObserver: Send + Sync {
    fn stage_started(&self, _stage: RunStage) {}
    fn stage_finished(&self, _stage: RunStage, _summary: &str) {}
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub channels_file: PathBuf,
    pub max_connections: u32,
    pub days: u32,
}

/// Produces the XMLTV guide from the written channels manifest.
#[async_trait]
pub trait GuideGenerator: Send + Sync {
    /// Returns the path of the produced artifact.
    async fn generate(&self, request: &GenerationRequest) -> Result<PathBuf, CoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Existing guide was fresh enough
    Skipped { age: Duration },
    Generated { guide: PathBuf },
    /// No generator configured for this run
    Disabled,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: MatchStats,
    pub cache_hit: bool,
    pub outputs: WrittenOutputs,
    pub generation: GenerationOutcome,
    pub duration: std::time::Duration,
}

/// Drives one reconciliation run from cache lookup to guide generation.
pub struct GuideSyncOrchestrator {
    loader: Box<dyn PlaylistLoader>,
    catalog_root: PathBuf,
    strategy: CatalogStrategy,
    cache: MatchCache,
    freshness: GuideFreshness,
    writer: ReportWriter,
    guide_file: PathBuf,
    max_connections: u32,
    days: u32,
    generator: Option<Box<dyn GuideGenerator>>,
    observer: Box<dyn RunObserver>,
}

impl GuideSyncOrchestrator {
    pub fn new(config: &Config, loader: Box<dyn PlaylistLoader>) -> Self {
        Self {
            loader,
            catalog_root: config.catalog.root.clone(),
            strategy: config.catalog.strategy,
            cache: MatchCache::new(config.cache.match_cache_file.clone(), config.cache.match_max_age()),
            freshness: GuideFreshness::new(config.cache.guide_max_age()),
            writer: ReportWriter::new(config.output.playlist_file.clone(), config.output.channels_file.clone()),
            guide_file: config.output.guide_file.clone(),
            max_connections: config.generator.max_connections,
            days: config.generator.days,
            generator: None,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_generator(mut self, generator: Box<dyn GuideGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// Identity of the inputs a cached result was computed from.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            playlist_source: self.loader.describe(),
            catalog_root: self.catalog_root.display().to_string(),
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, options: RunOptions) -> Result<RunReport, CoreError> {
        let start = Instant::now();
        let key = self.cache_key();

        self.observer.stage_started(RunStage::LoadingCache);
        let cached = if options.refresh_cache {
            info!("Cache refresh requested, ignoring match cache");
            None
        } else {
            self.cache.load(&key)
        };
        let cache_hit = cached.is_some();
        self.observer.stage_finished(
            RunStage::LoadingCache,
            if cache_hit { "cache hit" } else { "cache miss" },
        );

        let result = match cached {
            Some(result) => result,
            None => {
                let result = self.compute_matches().await?;
                // An empty result is never worth caching
                if !result.is_empty() {
                    self.observer.stage_started(RunStage::SavingCache);
                    match self.cache.save(&key, &result) {
                        Ok(()) => self.observer.stage_finished(RunStage::SavingCache, "saved"),
                        Err(e) => {
                            warn!("Failed to save match cache {:?}: {}", self.cache.path(), e);
                            self.observer.stage_finished(RunStage::SavingCache, "not saved");
                        }
                    }
                }
                result
            }
        };

        if result.is_empty() {
            warn!("No channels matched with EPG sources, nothing to write");
            return Err(CoreError::NoMatches { stats: result.stats });
        }

        self.observer.stage_started(RunStage::WritingOutputs);
        let outputs = self.writer.write(&result)?;
        self.observer.stage_finished(
            RunStage::WritingOutputs,
            &format!("{} channels, {} definitions", outputs.channel_count, outputs.definition_count),
        );

        let generation = self.generate_guide(&outputs, options).await?;

        Ok(RunReport {
            stats: result.stats,
            cache_hit,
            outputs,
            generation,
            duration: start.elapsed(),
        })
    }

    async fn compute_matches(&self) -> Result<MatchResult, CoreError> {
        self.observer.stage_started(RunStage::LoadingPlaylist);
        let content = self.loader.load().await?;
        let parsed = parse_playlist_report(&content);
        if parsed.incomplete > 0 {
            debug!("Dropped {} playlist entries without a stream URL", parsed.incomplete);
        }
        info!("Found {} channels in playlist {}", parsed.entries.len(), self.loader.describe());
        self.observer
            .stage_finished(RunStage::LoadingPlaylist, &format!("{} channels", parsed.entries.len()));

        self.observer.stage_started(RunStage::ScanningCatalog);
        let catalog = open_catalog(&self.catalog_root, self.strategy)?;
        self.observer.stage_finished(RunStage::ScanningCatalog, "ready");

        self.observer.stage_started(RunStage::Matching);
        let result = match_channels(&parsed.entries, catalog.as_ref());
        self.observer.stage_finished(
            RunStage::Matching,
            &format!("{}/{} matched", result.stats.matched, result.stats.total),
        );
        Ok(result)
    }

    async fn generate_guide(&self, outputs: &WrittenOutputs, options: RunOptions) -> Result<GenerationOutcome, CoreError> {
        let Some(generator) = self.generator.as_ref() else {
            debug!("Guide generation disabled for this run");
            return Ok(GenerationOutcome::Disabled);
        };

        if !options.refresh_guide {
            if let Freshness::Fresh(age) = self.freshness.check(&self.guide_file) {
                info!("EPG guide is fresh ({} old), skipping generation", format_age(age));
                return Ok(GenerationOutcome::Skipped { age });
            }
        }

        self.observer.stage_started(RunStage::GeneratingGuide);
        let request = GenerationRequest {
            channels_file: outputs.channels.clone(),
            max_connections: self.max_connections,
            days: self.days,
        };
        let artifact = generator.generate(&request).await?;
        relocate_guide(&artifact, &self.guide_file)?;
        self.observer
            .stage_finished(RunStage::GeneratingGuide, &self.guide_file.display().to_string());

        info!("EPG guide saved to {:?}", self.guide_file);
        Ok(GenerationOutcome::Generated {
            guide: self.guide_file.clone(),
        })
    }
}

/// Copy the generator's artifact to the configured guide location.
fn relocate_guide(artifact: &Path, guide_file: &Path) -> Result<(), CoreError> {
    if !artifact.is_file() {
        return Err(CoreError::Generation(format!(
            "guide artifact {} was not produced",
            artifact.display()
        )));
    }
    if artifact == guide_file {
        return Ok(());
    }
    if let Some(parent) = guide_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::write(parent, e))?;
    }
    std::fs::copy(artifact, guide_file).map_err(|e| CoreError::write(guide_file, e))?;
    Ok(())
}
