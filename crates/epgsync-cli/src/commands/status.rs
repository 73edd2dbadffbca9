use super::config::load_config;
use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use epgsync_config::Config;
use epgsync_core::{format_age, Freshness, GuideFreshness, GuideSyncOrchestrator};
use epgsync_sources::{discover_definition_files, loader_for, PlaylistSource};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Ok,
    Attention,
    Missing,
}

#[derive(Debug, Clone)]
pub struct StatusRow {
    pub item: &'static str,
    pub location: String,
    pub state: String,
    pub health: Health,
}

impl StatusRow {
    fn new(item: &'static str, location: impl Into<String>, state: impl Into<String>, health: Health) -> Self {
        Self {
            item,
            location: location.into(),
            state: state.into(),
            health,
        }
    }
}

pub async fn run_status(config_path: &Path, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let rows = collect_status(&config, config_path)?;

    if output.is_json() {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "item": row.item,
                    "location": row.location,
                    "state": row.state,
                    "ok": row.health == Health::Ok,
                })
            })
            .collect();
        output.json(&json!({ "type": "status", "items": items }));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Item").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Location").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("State").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for row in &rows {
        let color = match row.health {
            Health::Ok => Color::Green,
            Health::Attention => Color::Yellow,
            Health::Missing => Color::Red,
        };
        table.add_row(vec![
            Cell::new(row.item).fg(Color::Cyan),
            Cell::new(&row.location),
            Cell::new(&row.state).fg(color),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    output.println(table.to_string());
    Ok(())
}

pub fn collect_status(config: &Config, config_path: &Path) -> Result<Vec<StatusRow>> {
    let now = Utc::now();
    let mut rows = Vec::new();

    rows.push(if config_path.exists() {
        StatusRow::new("Config file", config_path.display().to_string(), "loaded", Health::Ok)
    } else {
        StatusRow::new("Config file", config_path.display().to_string(), "not found, using defaults", Health::Attention)
    });

    let source = PlaylistSource::parse(&config.playlist.source).map_err(|e| eyre!("{}", e))?;
    let source_kind = match source {
        PlaylistSource::File(_) => "local file",
        PlaylistSource::Url(_) => "remote",
    };
    rows.push(StatusRow::new("Playlist", source.to_string(), source_kind, Health::Ok));

    let catalog_root = config.catalog.root.display().to_string();
    rows.push(match discover_definition_files(&config.catalog.root) {
        Ok(files) if files.is_empty() => StatusRow::new("EPG sources", catalog_root, "no *.channels.xml files", Health::Attention),
        Ok(files) => StatusRow::new("EPG sources", catalog_root, format!("{} documents", files.len()), Health::Ok),
        Err(_) => StatusRow::new("EPG sources", catalog_root, "missing", Health::Missing),
    });

    let loader = loader_for(&source, Duration::from_secs(config.playlist.fetch_timeout_seconds));
    let orchestrator = GuideSyncOrchestrator::new(config, loader);
    let cache = orchestrator.cache();
    let cache_path = cache.path().display().to_string();
    rows.push(match cache.age_at(now) {
        None if cache.cache_exists() => StatusRow::new("Match cache", cache_path, "unreadable", Health::Attention),
        None => StatusRow::new("Match cache", cache_path, "missing", Health::Missing),
        Some(age) => match cache.load_at(&orchestrator.cache_key(), now) {
            Some(result) => StatusRow::new(
                "Match cache",
                cache_path,
                format!("valid, {} old, {} channels", format_age(age), result.matched_count()),
                Health::Ok,
            ),
            None => StatusRow::new("Match cache", cache_path, format!("expired, {} old", format_age(age)), Health::Attention),
        },
    });

    let guide_path = config.output.guide_file.display().to_string();
    rows.push(match GuideFreshness::new(config.cache.guide_max_age()).check_at(&config.output.guide_file, now) {
        Freshness::Fresh(age) => StatusRow::new("EPG guide", guide_path, format!("fresh, {} old", format_age(age)), Health::Ok),
        Freshness::Stale(age) => StatusRow::new("EPG guide", guide_path, format!("stale, {} old", format_age(age)), Health::Attention),
        Freshness::Missing => StatusRow::new("EPG guide", guide_path, "missing", Health::Missing),
    });

    for (item, path) in [
        ("Filtered playlist", &config.output.playlist_file),
        ("Channels file", &config.output.channels_file),
    ] {
        rows.push(if path.is_file() {
            StatusRow::new(item, path.display().to_string(), "present", Health::Ok)
        } else {
            StatusRow::new(item, path.display().to_string(), "missing", Health::Missing)
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.playlist.source = dir.join("us.m3u").display().to_string();
        config.catalog.root = dir.join("sites");
        config.cache.match_cache_file = dir.join("channel-cache.json");
        config.output.playlist_file = dir.join("playlist-filtered.m3u");
        config.output.channels_file = dir.join("channels.xml");
        config.output.guide_file = dir.join("guide.xml");
        config
    }

    fn row<'a>(rows: &'a [StatusRow], item: &str) -> &'a StatusRow {
        rows.iter().find(|r| r.item == item).unwrap()
    }

    #[test]
    fn test_empty_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let rows = collect_status(&config, &dir.path().join("config.toml")).unwrap();

        assert_eq!(row(&rows, "Config file").health, Health::Attention);
        assert_eq!(row(&rows, "Playlist").state, "local file");
        assert_eq!(row(&rows, "EPG sources").health, Health::Missing);
        assert_eq!(row(&rows, "Match cache").state, "missing");
        assert_eq!(row(&rows, "EPG guide").health, Health::Missing);
        assert_eq!(row(&rows, "Channels file").health, Health::Missing);
    }

    #[test]
    fn test_present_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(dir.path().join("sites").join("example.com")).unwrap();
        std::fs::write(
            dir.path().join("sites").join("example.com").join("example.com.channels.xml"),
            "<channels/>",
        )
        .unwrap();
        std::fs::write(&config.output.guide_file, "<tv/>").unwrap();
        std::fs::write(&config.output.playlist_file, "#EXTM3U\n").unwrap();
        std::fs::write(&config.cache.match_cache_file, "not json").unwrap();

        let rows = collect_status(&config, &dir.path().join("config.toml")).unwrap();
        assert_eq!(row(&rows, "EPG sources").state, "1 documents");
        assert_eq!(row(&rows, "EPG guide").health, Health::Ok);
        assert_eq!(row(&rows, "Filtered playlist").health, Health::Ok);
        assert_eq!(row(&rows, "Match cache").state, "unreadable");
    }
}
