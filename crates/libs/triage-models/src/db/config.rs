//! Database configuration.

/// Build index database configuration.
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_url: String,
}

impl DbConfig {
    /// Create a configuration pointing at the given SQLite file.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}
