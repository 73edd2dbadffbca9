use clap::{ArgAction, Parser, Subcommand};
use commands::run::RunArgs;
use commands::{clear, config, run, status};
use epgsync_config::PathManager;
use std::path::PathBuf;

mod commands;
mod generator;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "epgsync")]
#[command(about = "epgsync - Keep only the IPTV channels that have an EPG guide")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Configuration file (defaults to the per-user config file)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write logs to the daily-rotated log file
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the playlist, write the channel list and generate the EPG guide
    #[command(long_about = "Match every playlist channel's tvg-id against the provider channel definitions, write the filtered playlist and channels.xml, then run the EPG grabber unless the existing guide is still fresh. Exits with status 2 when no channel has an EPG source.")]
    Run {
        /// Ignore the match cache and re-match all channels
        #[arg(long, action = ArgAction::SetTrue)]
        refresh: bool,

        /// Regenerate the EPG guide even if it is still fresh
        #[arg(long, action = ArgAction::SetTrue)]
        refresh_epg: bool,

        /// Parallel connections for the EPG grabber
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        max_connections: Option<u32>,

        /// Days of programme data to grab
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,

        /// Playlist file path or http(s) URL
        #[arg(long, value_name = "SRC")]
        playlist: Option<String>,

        /// Directory holding <provider>/*.channels.xml definitions
        #[arg(long, value_name = "DIR")]
        catalog_root: Option<PathBuf>,

        /// Write the outputs but do not run the EPG grabber
        #[arg(long, action = ArgAction::SetTrue)]
        skip_generation: bool,
    },
    /// Show cache, guide and output state
    Status,
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear the match cache and/or generated outputs
    Clear {
        /// Clear the match cache and all generated outputs
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear the match cache
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Remove the filtered playlist, channels.xml and guide
        #[arg(long, action = ArgAction::SetTrue)]
        outputs: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = cli.log_file.then(|| PathManager::default().log_file());
    logging::init_logging(cli.verbose, cli.quiet, log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = config::resolve_config_path(cli.config);

    match cli.command {
        Commands::Run {
            refresh,
            refresh_epg,
            max_connections,
            days,
            playlist,
            catalog_root,
            skip_generation,
        } => {
            let args = RunArgs {
                refresh,
                refresh_epg,
                max_connections,
                days,
                playlist,
                catalog_root,
                skip_generation,
            };
            run::run_epg(args, &config_path, cli.quiet, &output).await
        }
        Commands::Status => status::run_status(&config_path, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            config::run_config(cmd, &config_path, &output).await
        }
        Commands::Clear { all, cache, outputs } => clear::run_clear(all, cache, outputs, &config_path, &output).await,
    }
}
