//! Common types and utilities.

/// Build index error type.
pub use crate::error::Error;

/// Build index result type.
pub type Result<T> = core::result::Result<T, Error>;
