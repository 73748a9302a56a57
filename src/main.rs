use std::path::PathBuf;
use std::process::ExitCode;

use airmap::{AirMapConfig, Coordinate, build_controller, logging, web};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about, propagate_version = true)]
struct Cli {
    /// Configuration file (TOML)
    #[clap(long, global = true, env = "AIRMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[clap(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the map page and the lookup API.
    Serve,

    /// Look up air quality once and write the map file.
    Lookup {
        /// Latitude in decimal degrees.
        #[clap(allow_hyphen_values = true)]
        latitude: String,

        /// Longitude in decimal degrees.
        #[clap(allow_hyphen_values = true)]
        longitude: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AirMapConfig::load_from_path(cli.config.clone())
        .with_context(|| "Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    let controller = build_controller(&config)?;

    match cli.command {
        Command::Serve => {
            let center = Coordinate::new(config.map.initial_latitude, config.map.initial_longitude)?;
            let map = controller
                .show_map(center)
                .await
                .with_context(|| "Failed to render the initial map")?;
            tracing::info!("Initial map written to {}", map.file.display());

            web::run(&config, controller).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Lookup {
            latitude,
            longitude,
        } => {
            let report = controller.lookup(&latitude, &longitude).await;
            println!("{}", report.message());
            if let Some(map) = &report.map {
                println!("Map: {}", map.file.display());
            }

            if report.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
