//! Build index models and storage layer for the triage scraper.
//!
//! Provides Diesel-based models over a local SQLite index that records every
//! discovered build and the object listing enumerated for it, so pipelines
//! can answer "is this build known?" and "which builds started in this
//! window?" without touching the remote store.
//!
//! # Usage
//!
//! ```rust,no_run
//! use triage_models::db::{config::DbConfig, connection::DbConnection};
//! use triage_models::build::build::BuildRow;
//!
//! let db = DbConnection::new(&DbConfig::new("./cache/index.db")).unwrap().setup().unwrap();
//! let recent = BuildRow::fetch_started_after(0, &db).unwrap();
//! println!("{} indexed builds", recent.len());
//! ```

pub mod build;
pub mod db;
pub mod error;
pub mod prelude;
mod schema;
