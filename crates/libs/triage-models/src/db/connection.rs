//! Database connection management and migrations.

use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::config::DbConfig;
use crate::prelude::*;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Applies SQLite pragmas on every pooled connection. Concurrent pipeline
/// workers share the index, so writes must wait instead of failing with
/// `SQLITE_BUSY`.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> core::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbConnection {
    /// SQLite connection pool.
    pub pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl DbConnection {
    /// Create a new database connection pool.
    pub fn new(config: &DbConfig) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(&config.database_url);
        let pool = Pool::builder()
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)?;
        Ok(Self { pool })
    }

    /// Run pending database migrations and return the configured connection.
    pub fn setup(self) -> Result<Self> {
        info!("Running database migrations");
        self.pool
            .get()?
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| Error::Migration(err.to_string()))?;
        Ok(self)
    }
}
