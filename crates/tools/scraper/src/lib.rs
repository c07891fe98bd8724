//! Scraper pipelines: build discovery, report export, and cache cleanup.
//!
//! The binary in `main.rs` wires these pipelines to the real object store
//! and cache directory; integration tests drive them against an in-memory
//! store.

pub mod cleanup;
pub mod cli;
pub mod discover;
pub mod error;
pub mod export;
pub mod pool;
pub mod prelude;
