#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the enrichment clients.
//!
//! Runs the geocoding and award search clients by hand with the same
//! configuration the application uses, printing results as JSON lines.

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures::StreamExt as _;
use govcon_award_search::{AwardSearchClient, AwardSearchFilter, SearchStep};
use govcon_enrichment_models::geocoding::SimpleGeocodingResult;
use govcon_geocoder::GeocodingClient;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "govcon_enrichment", about = "External data enrichment tools")]
struct Cli {
    /// Path to an enrichment TOML config (defaults to the embedded config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode addresses to coordinates and FIPS codes
    Geocode {
        /// One-line addresses (e.g., "1600 Pennsylvania Ave NW, Washington, DC, 20500")
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Search federal award history
    Awards {
        /// Comma-separated NAICS codes (overrides the configured allowlist)
        #[arg(long, value_delimiter = ',')]
        naics: Vec<String>,
        /// Comma-separated awarding agency names (overrides the configured allowlist)
        #[arg(long, value_delimiter = ',')]
        agencies: Vec<String>,
        /// Comma-separated award type codes (e.g., "A,B,C,D")
        #[arg(long, value_delimiter = ',')]
        award_types: Vec<String>,
        /// Days to look back from today
        #[arg(long)]
        lookback_days: Option<u32>,
    },
}

#[derive(Serialize)]
struct GeocodeLine<'a> {
    address: &'a str,
    result: Option<&'a SimpleGeocodingResult>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Geocode { addresses } => {
            let client = GeocodingClient::new(config.geocoding)?;

            let mut pending = addresses.as_slice();
            while !pending.is_empty() {
                let batch = client.geocode_batch(pending).await;
                for (address, result) in batch.in_input_order() {
                    let line = GeocodeLine { address, result };
                    println!("{}", serde_json::to_string(&line)?);
                }
                pending = batch.remaining;
            }
        }
        Commands::Awards {
            naics,
            agencies,
            award_types,
            lookback_days,
        } => {
            let client = AwardSearchClient::new(config.award_search)?;
            let filter = AwardSearchFilter {
                naics_codes: naics,
                agencies,
                award_types,
                lookback_days,
            };

            let mut steps = std::pin::pin!(client.search_steps(&filter));
            let mut count: u64 = 0;
            let mut capped = false;

            while let Some(step) = steps.next().await {
                match step {
                    Ok(SearchStep::Award(award)) => {
                        count += 1;
                        println!("{}", serde_json::to_string(&award)?);
                    }
                    Ok(SearchStep::Capped) => capped = true,
                    Err(e) => {
                        log::error!("Award search stopped early after {count} records");
                        return Err(e.into());
                    }
                }
            }

            if !client.config().enabled {
                log::info!("Award search is disabled in the configuration");
            } else if capped {
                log::info!("Award search stopped at the configured limit ({count} records)");
            } else {
                log::info!("Award search complete: {count} records");
            }
        }
    }

    Ok(())
}
