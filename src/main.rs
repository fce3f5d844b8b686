// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RunAtlas command-line entry point.
//!
//! `update` is the everyday command: sync from Strava, aggregate whatever is
//! new, regenerate the site. The other subcommands run the individual
//! stages on their own.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runatlas::config::Config;
use runatlas::services::{sync, AggregationEngine, EngineOutcome, Exporter, Geocoder, StravaClient};
use runatlas::store::{ActivityStore, StateCache, TrackStore};

#[derive(Parser)]
#[command(name = "runatlas", version, about = "Strava running dashboard generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the full activity history from Strava into the local stores
    Sync,
    /// Sync, aggregate new runs, and regenerate the site
    Update {
        /// Skip Strava and Nominatim; work from local data and caches only
        #[arg(long)]
        offline: bool,
    },
    /// Discard the aggregation state and recompute it from the local stores
    Rebuild {
        /// Resolve locations from the geocode cache only
        #[arg(long)]
        offline: bool,
    },
    /// Regenerate the site documents from the persisted state
    Export,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Sync => {
            run_sync(&config).await?;
        }
        Commands::Update { offline } => {
            let mut stores = Stores::open(&config)?;
            if offline {
                tracing::info!("Offline mode, skipping Strava sync");
            } else {
                let client = StravaClient::new(config.require_strava()?.clone());
                sync::sync(&client, &mut stores.activities, &mut stores.tracks).await?;
            }
            let outcome = run_engine(&config, &stores, offline, false).await?;
            export_site(&config, &stores, &outcome)?;
        }
        Commands::Rebuild { offline } => {
            let stores = Stores::open(&config)?;
            let outcome = run_engine(&config, &stores, offline, true).await?;
            export_site(&config, &stores, &outcome)?;
        }
        Commands::Export => {
            let stores = Stores::open(&config)?;
            let state = StateCache::new(config.state_path()).load_or_default();
            Exporter::new(&stores.activities, &stores.tracks, &state)
                .write_all(&config.site_dir())?;
        }
    }

    Ok(())
}

/// The two read stores every command starts from.
struct Stores {
    activities: ActivityStore,
    tracks: TrackStore,
}

impl Stores {
    fn open(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            activities: ActivityStore::open(config.activities_csv())?,
            tracks: TrackStore::open(config.tracks_dir())?,
        })
    }
}

async fn run_sync(config: &Config) -> anyhow::Result<()> {
    let client = StravaClient::new(config.require_strava()?.clone());
    let mut stores = Stores::open(config)?;
    sync::sync(&client, &mut stores.activities, &mut stores.tracks).await?;
    Ok(())
}

async fn run_engine(
    config: &Config,
    stores: &Stores,
    offline: bool,
    rebuild: bool,
) -> anyhow::Result<EngineOutcome> {
    let mut geocoder = if offline {
        Geocoder::offline(config.geocode_cache_path())
    } else {
        Geocoder::new(
            config.geocode_cache_path(),
            config.nominatim_base_url.clone(),
            config.geocoder_user_agent.clone(),
            config.geocode_min_interval,
        )
    };

    let cache = StateCache::new(config.state_path());
    let mut engine =
        AggregationEngine::new(&stores.activities, &stores.tracks, &mut geocoder, &cache);
    let outcome = if rebuild {
        engine.rebuild().await?
    } else {
        engine.run().await?
    };
    Ok(outcome)
}

fn export_site(config: &Config, stores: &Stores, outcome: &EngineOutcome) -> anyhow::Result<()> {
    Exporter::new(&stores.activities, &stores.tracks, &outcome.state)
        .write_all(&config.site_dir())?;
    Ok(())
}

/// Initialize console logging with an env-filter override.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("runatlas=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
