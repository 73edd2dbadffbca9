use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use epgsync_config::{Config, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};

pub async fn run_config(cmd: crate::ConfigCommands, config_path: &Path, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(config_path, output),
        crate::ConfigCommands::Init { force } => init_config(config_path, force, output).map(|_| ()),
    }
}

/// `--config` when given, otherwise the per-user config file.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathManager::default().config_file())
}

/// Read the configuration without validating it; a missing file means defaults.
pub fn read_config(config_path: &Path) -> Result<Config> {
    Config::load_or_default(config_path)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_path.display(), e))
}

pub fn load_config(config_path: &Path) -> Result<Config> {
    let config = read_config(config_path)?;
    config.validate().map_err(|e| eyre!("{}", e))?;
    Ok(config)
}

fn show_config(config_path: &Path, output: &Output) -> Result<()> {
    let exists = config_path.exists();
    let config = load_config(config_path)?;

    if output.is_json() {
        output.json(&json!({
            "config_file": config_path.display().to_string(),
            "exists": exists,
            "config": serde_json::to_value(&config)?,
        }));
        return Ok(());
    }

    let mut info_table = Table::new();
    info_table.set_header(vec![
        Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(config_path.display().to_string()),
    ]);
    info_table.load_preset(comfy_table::presets::UTF8_FULL);
    info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    output.println(info_table.to_string());

    if !exists {
        output.warn("Configuration file not found, showing defaults");
        output.println(format!("Create one with: {}", "epgsync config init".bright_cyan()));
    }

    let rendered = toml::to_string_pretty(&config)?;
    output.println(format!("\n{}", rendered.trim_end()));
    Ok(())
}

/// Write the default configuration; returns whether a file was written.
fn init_config(config_path: &Path, force: bool, output: &Output) -> Result<bool> {
    if config_path.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
        return Ok(false);
    }

    Config::default()
        .save_to_file(config_path)
        .map_err(|e| eyre!("{}", e))?;
    output.success(format!("Wrote default configuration to {}", config_path.display()));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn quiet_output() -> Output {
        Output::new(OutputFormat::Human, true)
    }

    #[test]
    fn test_init_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epgsync").join("config.toml");

        assert!(init_config(&path, false, &quiet_output()).unwrap());
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.generator.max_connections, 5);

        std::fs::write(&path, "[generator]\ndays = 3\n").unwrap();
        assert!(!init_config(&path, false, &quiet_output()).unwrap());
        assert_eq!(load_config(&path).unwrap().generator.days, 3);

        assert!(init_config(&path, true, &quiet_output()).unwrap());
        assert_eq!(load_config(&path).unwrap().generator.days, 1);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generator]\nmax_connections = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.cache.match_max_age_hours, 24);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = PathBuf::from("/tmp/custom.toml");
        assert_eq!(resolve_config_path(Some(path.clone())), path);
    }
}
