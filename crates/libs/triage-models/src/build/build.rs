//! Indexed build records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::db::connection::DbConnection;
use crate::prelude::*;
use crate::schema::builds::dsl::*;

/// One discovered build. Immutable once saved; `(job, build_id)` is the
/// primary key.
#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Insertable, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::builds)]
#[diesel(primary_key(job, build_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BuildRow {
    /// Build group name.
    pub job: String,
    /// Build identifier within the group.
    pub build_id: String,
    /// Start time from the build's started record, as a unix timestamp.
    pub started_at: i64,
    /// Object-store bucket holding the build's files.
    pub gcs_bucket: String,
    /// Object path prefix of the build's files, ending with `/`.
    pub gcs_prefix: String,
}

impl BuildRow {
    /// Saves the build. Fails with [`Error::Duplicate`] if the build is
    /// already indexed.
    pub fn save(&self, connection: &DbConnection) -> Result<()> {
        trace!("Saving build {} @ {}...", self.job, self.build_id);

        let conn = &mut connection.pool.get()?;
        diesel::insert_into(builds).values(self).execute(conn)?;
        Ok(())
    }

    /// Fetches one build by its key. Fails with [`Error::NotFound`] if the
    /// build is not indexed.
    pub fn fetch(target_job: &str, target_build_id: &str, connection: &DbConnection) -> Result<Self> {
        trace!("Loading build {} @ {} from the index...", target_job, target_build_id);

        let conn = &mut connection.pool.get()?;
        Ok(builds
            .filter(job.eq(target_job).and(build_id.eq(target_build_id)))
            .select(BuildRow::as_select())
            .get_result(conn)?)
    }

    /// Fetches every build with `started_at >= threshold`.
    pub fn fetch_started_after(threshold: i64, connection: &DbConnection) -> Result<Vec<Self>> {
        trace!("Loading builds started at or after {}...", threshold);

        let conn = &mut connection.pool.get()?;
        Ok(builds
            .filter(started_at.ge(threshold))
            .select(BuildRow::as_select())
            .load(conn)?)
    }

    /// Fetches every build with `started_at < threshold`, the complement of
    /// [`BuildRow::fetch_started_after`].
    pub fn fetch_started_before(threshold: i64, connection: &DbConnection) -> Result<Vec<Self>> {
        trace!("Loading builds started before {}...", threshold);

        let conn = &mut connection.pool.get()?;
        Ok(builds
            .filter(started_at.lt(threshold))
            .select(BuildRow::as_select())
            .load(conn)?)
    }

    /// Deletes one build by its key. Deleting an unindexed build is not an
    /// error.
    pub fn delete(target_job: &str, target_build_id: &str, connection: &DbConnection) -> Result<()> {
        trace!("Deleting build {} @ {}...", target_job, target_build_id);

        let conn = &mut connection.pool.get()?;
        diesel::delete(builds.filter(job.eq(target_job).and(build_id.eq(target_build_id))))
            .execute(conn)?;
        Ok(())
    }
}
