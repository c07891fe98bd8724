//! Configuration error types.

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// YAML deserialization failed.
    #[error(transparent)]
    Deserialization(#[from] serde_yaml::Error),
}
