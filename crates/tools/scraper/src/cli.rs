use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scraper")]
#[command(about = "Scrape CI build artifacts and export triage reports")]
pub struct Cli {
    /// Directory holding the raw file cache, the value cache, and the
    /// build index
    #[arg(long, global = true, default_value = "./cache")]
    pub cache_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find new builds and index their start times
    Discover {
        /// Configuration files listing the build groups to scan
        #[arg(required = true)]
        configs: Vec<PathBuf>,

        /// Number of workers to spawn
        #[arg(short = 'w', long, default_value_t = 10)]
        num_workers: usize,

        /// Index only builds younger than this many days; 0 disables the
        /// window
        #[arg(long, default_value_t = 14)]
        age_days: u32,
    },

    /// Generate triage reports for indexed builds
    Export {
        /// File to save the builds report
        #[arg(long)]
        builds: Option<PathBuf>,

        /// File to save the test failures report
        #[arg(long)]
        tests: Option<PathBuf>,

        /// File to save the per-test summary report
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Number of workers to spawn
        #[arg(short = 'w', long, default_value_t = 10)]
        num_workers: usize,

        /// Export only builds younger than this many days; 0 disables the
        /// window
        #[arg(long, default_value_t = 14)]
        age_days: u32,
    },

    /// Drop caches and index rows of builds older than the window
    Cleanup {
        /// Delete builds older than this many days
        #[arg(long, default_value_t = 14)]
        age_days: u32,
    },
}
