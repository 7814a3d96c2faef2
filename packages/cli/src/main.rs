#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the trip map.
//!
//! Uses `indicatif-log-bridge` (via [`trip_map_cli_utils::init_logger`])
//! so that log lines and the geocoding progress bar share the terminal.

mod render;

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use trip_map_cli_utils::{IndicatifProgress, MultiProgress};
use trip_map_itinerary::config::TripConfig;
use trip_map_itinerary::geojson_export::to_geojson_string;
use trip_map_itinerary::{LogProgress, ProgressCallback, RefreshMode, TripSession};

#[derive(Parser)]
#[command(name = "trip_map", about = "Travel itinerary map: geocode, summarize, export")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Itinerary CSV URL or local path (overrides config and `TRIP_MAP_FEED_URL`)
    #[arg(long, global = true)]
    feed: Option<String>,
    /// Snapshot file (overrides config and `TRIP_MAP_SNAPSHOT`)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Geocode cache file (overrides config and `TRIP_MAP_CACHE`)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,
    /// Hide progress output
    #[arg(long, short, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the itinerary timeline and trip statistics (default)
    Show {
        /// Ignore any snapshot and resolve the feed live
        #[arg(long)]
        live: bool,
    },
    /// Resolve the feed live and write the snapshot file
    Precompute {
        /// Where to write the snapshot (defaults to the configured path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Resolve a single place name through the geocode cache
    Geocode {
        /// Free-text place, e.g. "Vienna, Austria"
        place: String,
    },
    /// Write the itinerary as a `GeoJSON` `FeatureCollection`
    ExportGeojson {
        /// Output file; prints to stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// Ignore any snapshot and resolve the feed live
        #[arg(long)]
        live: bool,
    },
    /// Print trip statistics as JSON
    Kpis {
        /// Ignore any snapshot and resolve the feed live
        #[arg(long)]
        live: bool,
    },
}

/// Rows between progress log lines when stderr is not a terminal.
const LOG_PROGRESS_EVERY: u64 = 10;

const fn refresh_mode(live: bool) -> RefreshMode {
    if live {
        RefreshMode::Live
    } else {
        RefreshMode::Auto
    }
}

fn progress_bar(multi: &MultiProgress, quiet: bool) -> Arc<dyn ProgressCallback> {
    if quiet {
        IndicatifProgress::hidden()
    } else if !std::io::stderr().is_terminal() {
        LogProgress::new("geocode", LOG_PROGRESS_EVERY)
    } else {
        IndicatifProgress::rows_bar(multi, "Loading itinerary")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = trip_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = TripConfig::load(cli.config.as_deref())?;
    if let Some(feed) = cli.feed {
        config.feed_url = feed;
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = snapshot;
    }
    if let Some(cache) = cli.cache {
        config.cache_path = cache;
    }

    let session = TripSession::new(config)?;
    let command = cli.command.unwrap_or(Commands::Show { live: false });

    match command {
        Commands::Show { live } => {
            let progress = progress_bar(&multi, cli.quiet);
            let view = session.refresh(refresh_mode(live), &progress).await?;
            print!("{}", render::timeline(&view));
        }
        Commands::Precompute { output } => {
            let start = Instant::now();
            let progress = progress_bar(&multi, cli.quiet);
            let view = session.precompute(output.as_deref(), &progress).await?;
            log::info!(
                "Precompute finished in {:.1}s",
                start.elapsed().as_secs_f64()
            );
            println!("{}", render::summary(&view));
        }
        Commands::Geocode { place } => match session.geocode(&place).await? {
            Some(c) => println!("{place}: {:.6}, {:.6}", c.latitude, c.longitude),
            None => return Err(format!("No match for '{place}'").into()),
        },
        Commands::ExportGeojson { output, live } => {
            let progress = progress_bar(&multi, cli.quiet);
            let view = session.refresh(refresh_mode(live), &progress).await?;
            let json = to_geojson_string(&view.itinerary)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!(
                        "Wrote {} stops to {}",
                        view.itinerary.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        Commands::Kpis { live } => {
            let progress = progress_bar(&multi, cli.quiet);
            let view = session.refresh(refresh_mode(live), &progress).await?;
            println!("{}", serde_json::to_string_pretty(&view.kpis)?);
        }
    }

    Ok(())
}
