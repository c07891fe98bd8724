//! Cached object listings for indexed builds.

use std::collections::BTreeSet;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::db::connection::DbConnection;
use crate::prelude::*;
use crate::schema::build_files::dsl::*;

/// The object listing snapshot taken for one build. Never refreshed once
/// saved; cleanup deletes it together with the build.
#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Insertable, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::build_files)]
#[diesel(primary_key(job, build_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BuildFilesRow {
    /// Build group name.
    pub job: String,
    /// Build identifier within the group.
    pub build_id: String,
    /// When this listing was taken, as a unix timestamp.
    pub created_at: i64,
    /// JSON-serialized set of absolute object paths.
    pub files: String,
}

impl BuildFilesRow {
    /// Builds a row for the given file set, timestamped now.
    pub fn create(
        target_job: impl Into<String>,
        target_build_id: impl Into<String>,
        file_set: &BTreeSet<String>,
    ) -> Result<Self> {
        Ok(Self {
            job: target_job.into(),
            build_id: target_build_id.into(),
            created_at: chrono::Utc::now().timestamp(),
            files: serde_json::to_string(file_set)?,
        })
    }

    /// Saves the listing. Fails with [`Error::Duplicate`] if a listing for
    /// this build already exists.
    pub fn save(&self, connection: &DbConnection) -> Result<()> {
        trace!("Saving build files for {} @ {}...", self.job, self.build_id);

        let conn = &mut connection.pool.get()?;
        diesel::insert_into(build_files).values(self).execute(conn)?;
        Ok(())
    }

    /// Fetches the listing for one build. Fails with [`Error::NotFound`] if
    /// no listing was saved.
    pub fn fetch(target_job: &str, target_build_id: &str, connection: &DbConnection) -> Result<Self> {
        trace!(
            "Loading build files for {} @ {} from the index...",
            target_job, target_build_id
        );

        let conn = &mut connection.pool.get()?;
        Ok(build_files
            .filter(job.eq(target_job).and(build_id.eq(target_build_id)))
            .select(BuildFilesRow::as_select())
            .get_result(conn)?)
    }

    /// Deserializes the stored file set.
    pub fn file_set(&self) -> Result<BTreeSet<String>> {
        Ok(serde_json::from_str(&self.files)?)
    }

    /// Deletes the listing for one build. Deleting a missing listing is not
    /// an error.
    pub fn delete(target_job: &str, target_build_id: &str, connection: &DbConnection) -> Result<()> {
        trace!("Deleting build files for {} @ {}...", target_job, target_build_id);

        let conn = &mut connection.pool.get()?;
        diesel::delete(build_files.filter(job.eq(target_job).and(build_id.eq(target_build_id))))
            .execute(conn)?;
        Ok(())
    }
}
