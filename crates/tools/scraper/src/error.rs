//! Scraper error types.

/// Errors that can occur in the scraper pipelines.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] triage_config::error::Error),

    /// Build index operation failed.
    #[error(transparent)]
    Models(#[from] triage_models::error::Error),

    /// Artifact access failed.
    #[error(transparent)]
    Artifacts(#[from] triage_artifacts::error::Error),

    /// Value cache operation failed.
    #[error(transparent)]
    KvCache(#[from] triage_kvcache::error::Error),

    /// A spawned task panicked or was cancelled.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    /// An invariant the pipelines rely on was violated. Always fatal.
    #[error("internal error: {0}")]
    Internal(String),
}
