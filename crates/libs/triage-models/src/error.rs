//! Build index error types.

use diesel::result::DatabaseErrorKind;

/// Build index operation errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The requested row does not exist. Callers branch on this.
    #[error("record not found")]
    NotFound,

    /// A row with the same `(job, build_id)` key already exists.
    #[error("record already exists")]
    Duplicate,

    /// Database connection pool error.
    #[error(transparent)]
    R2D2(#[from] diesel::r2d2::PoolError),

    /// Diesel ORM operation error.
    #[error(transparent)]
    Diesel(diesel::result::Error),

    /// Database migrations failed.
    #[error("failed to run database migrations: {0}")]
    Migration(String),

    /// File set serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::Duplicate
            }
            err => Error::Diesel(err),
        }
    }
}

impl Error {
    /// Whether this error is the distinguished not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// Whether this error is a unique-key violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Duplicate)
    }
}
