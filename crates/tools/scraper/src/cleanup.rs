//! Cleanup pipeline: drop everything cached for builds older than the
//! window.

use tracing::info;
use triage_artifacts::fscache::FsCache;
use triage_kvcache::KvCache;
use triage_models::build::build::BuildRow;
use triage_models::build::build_files::BuildFilesRow;
use triage_models::db::connection::DbConnection;

use crate::prelude::*;

/// Delete every build with `started_at < created_before` from all three
/// tiers.
///
/// Per build the order is value cache, raw cache, listing row, build row.
/// The build row goes last so an interrupted run leaves the build
/// discoverable and a re-run finishes the job.
pub fn run(
    created_before: i64,
    db: &DbConnection,
    fscache: &FsCache,
    kvcache: &KvCache,
) -> Result<()> {
    let rows = BuildRow::fetch_started_before(created_before, db)?;
    info!("Cleaning up {} builds", rows.len());

    for row in rows {
        info!("Cleaning up {} @ {}...", row.job, row.build_id);

        kvcache.delete(&format!("{}/{}", row.job, row.build_id))?;
        fscache.delete_by_prefix(&format!("{}/{}", row.gcs_bucket, row.gcs_prefix))?;
        BuildFilesRow::delete(&row.job, &row.build_id, db)?;
        BuildRow::delete(&row.job, &row.build_id, db)?;
    }

    Ok(())
}
