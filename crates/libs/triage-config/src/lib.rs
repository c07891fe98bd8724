//! Build group configuration for the triage scraper.
//!
//! A configuration file lists the build groups to scrape, each with a name
//! and the `bucket/path/` prefix of its builds in the object store.
//!
//! # Usage
//!
//! ```rust,no_run
//! use triage_config::Config;
//! use std::path::Path;
//!
//! let config = Config::from_file(Path::new("testgrid.yaml")).unwrap();
//! for group in &config.test_groups {
//!     println!("{}: gs://{}", group.name, group.gcs_prefix);
//! }
//! ```

pub mod config;
pub mod error;
pub mod prelude;

pub use config::{Config, TestGroup};
