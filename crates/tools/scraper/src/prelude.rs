//! Common types and utilities.

/// Scraper error type.
pub use crate::error::Error;

/// Scraper result type.
pub type Result<T> = core::result::Result<T, Error>;
