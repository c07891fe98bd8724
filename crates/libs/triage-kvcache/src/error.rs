//! Value cache error types.

/// Value cache errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The key has no cached value. Callers branch on this.
    #[error("key {key} not found")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The key ends with the reserved temporary-file suffix.
    #[error("key should not end with {suffix:?}: {key}")]
    ReservedSuffix {
        /// The offending key.
        key: String,
        /// The reserved suffix.
        suffix: &'static str,
    },

    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is the distinguished not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
