//! Scraper binary.
//!
//! Wires the pipelines in the library to Google Cloud Storage and one local
//! cache directory:
//!
//! - raw file cache at the directory root, keyed `bucket/object`
//! - value cache under `builds/`
//! - build index at `index.db`

use std::fs;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_artifacts::fscache::FsCache;
use triage_artifacts::{ArtifactClient, GcsClient};
use triage_kvcache::KvCache;
use triage_models::db::config::DbConfig;
use triage_models::db::connection::DbConnection;

use scraper::cli::{Cli, Commands};
use scraper::prelude::*;
use scraper::{cleanup, discover, export};

/// Unix timestamp `age_days` before now, or 0 when the window is disabled.
fn cutoff(age_days: u32) -> i64 {
    if age_days == 0 {
        return 0;
    }
    chrono::Utc::now().timestamp() - i64::from(age_days) * 24 * 60 * 60
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    fs::create_dir_all(&cli.cache_dir)?;
    let db_path = cli.cache_dir.join("index.db");
    let db = DbConnection::new(&DbConfig::new(db_path.display().to_string()))?.setup()?;

    match cli.command {
        Commands::Discover {
            configs,
            num_workers,
            age_days,
        } => {
            let client = Arc::new(ArtifactClient::new(GcsClient::new()?, &cli.cache_dir));
            let opts = discover::DiscoverOptions {
                config_paths: configs,
                num_workers,
                created_after: cutoff(age_days),
            };
            discover::run(&opts, db, client).await
        }
        Commands::Export {
            builds,
            tests,
            summary,
            num_workers,
            age_days,
        } => {
            let client = Arc::new(ArtifactClient::new(GcsClient::new()?, &cli.cache_dir));
            let kvcache = Arc::new(KvCache::new(cli.cache_dir.join("builds")));
            let opts = export::ExportOptions {
                builds,
                tests,
                summary,
                num_workers,
                created_after: cutoff(age_days),
            };
            export::run(opts, db, client, kvcache).await
        }
        Commands::Cleanup { age_days } => {
            let fscache = FsCache::new(&cli.cache_dir);
            let kvcache = KvCache::new(cli.cache_dir.join("builds"));
            cleanup::run(cutoff(age_days), &db, &fscache, &kvcache)
        }
    }
}
