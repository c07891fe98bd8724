//! Common types and utilities.

/// Value cache error type.
pub use crate::error::Error;

/// Value cache result type.
pub type Result<T> = core::result::Result<T, Error>;
