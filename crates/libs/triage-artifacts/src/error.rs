//! Artifact access error types.

/// Artifact access errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The remote object does not exist. Callers branch on this.
    #[error("object not found: gs://{bucket}/{object}")]
    ObjectNotFound {
        /// Bucket name.
        bucket: String,
        /// Object path within the bucket.
        object: String,
    },

    /// A metadata document exists but does not parse as valid JSON.
    #[error("unable to decode gs://{bucket}/{object}: {source}")]
    InvalidDocument {
        /// Bucket name.
        bucket: String,
        /// Object path within the bucket.
        object: String,
        /// The underlying decode failure.
        source: serde_json::Error,
    },

    /// A group's `gcs_prefix` is not of the `bucket/path/` form.
    #[error("invalid gcs prefix for {group}: {prefix}")]
    InvalidPrefix {
        /// Group name.
        group: String,
        /// The offending prefix.
        prefix: String,
    },

    /// The store listed an object that does not extend the listed prefix.
    #[error("unexpected object from the store: expected prefix {prefix:?}, got {object:?}")]
    UnexpectedObject {
        /// The prefix that was listed.
        prefix: String,
        /// The object that came back.
        object: String,
    },

    /// The remote store answered with an unexpected status.
    #[error("unexpected status {status} for {url}")]
    Status {
        /// Request URL.
        url: String,
        /// Response status code.
        status: reqwest::StatusCode,
    },

    /// HTTP transport failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Local cache I/O failure.
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ObjectNotFound { .. })
    }

    /// Whether this error means a document exists but is corrupt.
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, Error::InvalidDocument { .. })
    }
}
