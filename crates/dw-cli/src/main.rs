use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dw_cli::commands::{clear, report, track};
use dw_cli::{Cli, Commands, Config};
use dw_core::tracker::TrackerConfig;
use dw_db::BucketStore;
use dw_sync::Forwarder;

/// Load config and open the bucket store, ensuring the parent directory
/// exists.
fn open_store(config_path: Option<&Path>) -> Result<(BucketStore, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let store = BucketStore::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((store, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Track { input, no_forward }) => {
            let (mut store, config) = open_store(cli.config.as_deref())?;

            // Forwarding is best-effort from the start: a forwarder that
            // cannot even spawn downgrades to local-only tracking.
            let forwarder = if *no_forward {
                None
            } else {
                config.remote_endpoint.as_ref().and_then(|endpoint| {
                    match Forwarder::spawn(endpoint) {
                        Ok(forwarder) => Some(forwarder),
                        Err(err) => {
                            tracing::warn!(error = %err, "forwarding disabled");
                            None
                        }
                    }
                })
            };

            let tracker_config = TrackerConfig {
                idle_threshold_ms: config.idle_threshold_ms,
            };
            let summary = match input {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    track::process(
                        BufReader::new(file),
                        &mut store,
                        forwarder.as_ref(),
                        &config.classifier,
                        &tracker_config,
                    )?
                }
                None => track::process(
                    io::stdin().lock(),
                    &mut store,
                    forwarder.as_ref(),
                    &config.classifier,
                    &tracker_config,
                )?,
            };

            if let Some(forwarder) = forwarder {
                forwarder.shutdown();
            }
            println!(
                "{} session(s), {} tracked",
                summary.sessions,
                report::format_duration(summary.accumulated_ms)
            );
            if summary.merge_failures > 0 {
                eprintln!("{} session(s) failed to merge locally", summary.merge_failures);
            }
        }
        Some(Commands::Report { day, json }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            let day = day.unwrap_or_else(|| Utc::now().date_naive());
            report::run(&store, day, *json)?;
        }
        Some(Commands::Clear { day }) => {
            let (mut store, _config) = open_store(cli.config.as_deref())?;
            let day = day.unwrap_or_else(|| Utc::now().date_naive());
            clear::run(&mut store, day)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
