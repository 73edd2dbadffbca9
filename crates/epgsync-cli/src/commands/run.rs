use super::config::read_config;
use super::run_ui::RunUI;
use crate::generator::CommandGenerator;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use epgsync_config::Config;
use epgsync_core::{format_age, CoreError, GenerationOutcome, GuideSyncOrchestrator, RunOptions, RunReport};
use epgsync_models::MatchStats;
use epgsync_sources::{loader_for, PlaylistSource};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Exit status when no playlist channel has an EPG source.
pub const NO_MATCHES_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub refresh: bool,
    pub refresh_epg: bool,
    pub max_connections: Option<u32>,
    pub days: Option<u32>,
    pub playlist: Option<String>,
    pub catalog_root: Option<PathBuf>,
    pub skip_generation: bool,
}

impl RunArgs {
    /// Command-line values take precedence over the file.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(source) = &self.playlist {
            config.playlist.source = source.clone();
        }
        if let Some(root) = &self.catalog_root {
            config.catalog.root = root.clone();
        }
        if let Some(max_connections) = self.max_connections {
            config.generator.max_connections = max_connections;
        }
        if let Some(days) = self.days {
            config.generator.days = days;
        }
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            refresh_cache: self.refresh,
            refresh_guide: self.refresh_epg,
        }
    }
}

pub async fn run_epg(args: RunArgs, config_path: &Path, quiet: bool, output: &Output) -> Result<()> {
    tracing::debug!("Run command started");

    let mut config = read_config(config_path)?;
    args.apply_to(&mut config);
    config.validate().map_err(|e| eyre!("{}", e))?;

    let source = PlaylistSource::parse(&config.playlist.source).map_err(|e| eyre!("{}", e))?;
    let loader = loader_for(&source, Duration::from_secs(config.playlist.fetch_timeout_seconds));

    let mut orchestrator = GuideSyncOrchestrator::new(&config, loader)
        .with_observer(Box::new(RunUI::new(quiet || output.is_json())));
    if !args.skip_generation {
        orchestrator = orchestrator.with_generator(Box::new(CommandGenerator::from_config(&config.generator)));
    }

    match orchestrator.run(args.options()).await {
        Ok(report) => {
            print_report(&report, output);
            Ok(())
        }
        Err(CoreError::NoMatches { stats }) => {
            drop(orchestrator);
            print_no_matches(&stats, output);
            std::process::exit(NO_MATCHES_EXIT_CODE);
        }
        Err(e) => Err(e.into()),
    }
}

fn stats_json(stats: &MatchStats) -> serde_json::Value {
    json!({
        "total": stats.total,
        "matched": stats.matched,
        "skipped_no_tvg_id": stats.skipped,
        "removed_no_epg": stats.removed,
    })
}

fn print_report(report: &RunReport, output: &Output) {
    let generation = match &report.generation {
        GenerationOutcome::Skipped { age } => json!({ "status": "skipped", "age_hours": age.num_seconds() as f64 / 3600.0 }),
        GenerationOutcome::Generated { guide } => json!({ "status": "generated", "guide": guide.display().to_string() }),
        GenerationOutcome::Disabled => json!({ "status": "disabled" }),
    };

    if output.is_json() {
        output.json(&json!({
            "type": "run",
            "cache_hit": report.cache_hit,
            "stats": stats_json(&report.stats),
            "playlist_file": report.outputs.playlist.display().to_string(),
            "channels_file": report.outputs.channels.display().to_string(),
            "definitions": report.outputs.definition_count,
            "generation": generation,
            "duration_ms": report.duration.as_millis() as u64,
        }));
        return;
    }

    let stats = &report.stats;
    output.println("");
    output.println(format!("Total channels in playlist: {}", stats.total));
    output.println(format!("Channels with EPG:          {}", stats.matched));
    output.println(format!("Without tvg-id:             {}", stats.skipped));
    output.println(format!("Without EPG source:         {}", stats.removed));
    if report.cache_hit {
        output.info("(from match cache)");
    }
    output.println("");

    output.success(format!(
        "Filtered playlist saved to {} ({} channels)",
        report.outputs.playlist.display(),
        report.outputs.channel_count
    ));
    output.success(format!(
        "Channel definitions saved to {} ({} entries)",
        report.outputs.channels.display(),
        report.outputs.definition_count
    ));

    match &report.generation {
        GenerationOutcome::Skipped { age } => {
            output.info(format!("EPG guide is fresh ({} old), skipped generation", format_age(*age)));
        }
        GenerationOutcome::Generated { guide } => {
            output.success(format!("EPG guide saved to {}", guide.display()));
        }
        GenerationOutcome::Disabled => output.info("EPG generation skipped (--skip-generation)"),
    }
}

fn print_no_matches(stats: &MatchStats, output: &Output) {
    if output.is_json() {
        output.json(&json!({
            "type": "error",
            "message": "No channels were matched with EPG sources",
            "stats": stats_json(stats),
        }));
        return;
    }
    output.error(CoreError::NoMatches { stats: *stats }.to_string());
    output.println("Nothing was written. Check that the catalog root contains *.channels.xml files.");
}
