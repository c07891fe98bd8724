//! Discovery pipeline: find new builds and index their start times.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};
use triage_artifacts::ArtifactClient;
use triage_artifacts::store::ObjectStore;
use triage_artifacts::types::Build;
use triage_config::{Config, TestGroup};
use triage_models::build::build::BuildRow;
use triage_models::db::connection::DbConnection;

use crate::pool::process_all;
use crate::prelude::*;

/// Discovery run parameters.
pub struct DiscoverOptions {
    /// Configuration files listing the build groups to scan.
    pub config_paths: Vec<PathBuf>,
    /// Worker pool size; groups are processed concurrently.
    pub num_workers: usize,
    /// Index only builds with `started_at >= created_after`; 0 disables the
    /// window.
    pub created_after: i64,
}

/// Scan every configured build group and persist newly-seen builds.
///
/// The first unrecoverable error in any group aborts the whole run; a
/// partially-updated index is safe to re-run against.
pub async fn run<S: ObjectStore + 'static>(
    opts: &DiscoverOptions,
    db: DbConnection,
    client: Arc<ArtifactClient<S>>,
) -> Result<()> {
    let mut test_groups = Vec::new();
    for path in &opts.config_paths {
        let config = Config::from_file(path)?;
        test_groups.extend(config.test_groups);
    }

    info!("Discovering builds for {} groups", test_groups.len());

    let created_after = opts.created_after;
    process_all(test_groups, opts.num_workers, move |group| {
        let db = db.clone();
        let client = Arc::clone(&client);
        async move { discover_group(&group, created_after, &db, &client).await }
    })
    .await
}

async fn discover_group<S: ObjectStore>(
    group: &TestGroup,
    created_after: i64,
    db: &DbConnection,
    client: &ArtifactClient<S>,
) -> Result<()> {
    let mut builds = client.find_builds(&group.name, &group.gcs_prefix).await?;
    // The store lists lexicographically oldest-first; the age cutoff below
    // is only correct walking newest-first.
    builds.reverse();

    for build in builds {
        let started_at = match BuildRow::fetch(&build.job, &build.build_id, db) {
            Ok(row) => row.started_at,
            Err(err) if err.is_not_found() => match index_new_build(&build, db, client).await? {
                Some(started_at) => started_at,
                None => continue,
            },
            Err(err) => return Err(err.into()),
        };

        if created_after != 0 && started_at < created_after {
            // Everything older was handled by a previous run or is out of
            // the window.
            break;
        }
    }
    Ok(())
}

/// Fetch a new build's started record and persist it. Returns `None` when
/// the build should be skipped: it never started, or its record is corrupt.
async fn index_new_build<S: ObjectStore>(
    build: &Build,
    db: &DbConnection,
    client: &ArtifactClient<S>,
) -> Result<Option<i64>> {
    debug!("Discovered new build: {}", build);

    let started = match client.get_started(build).await {
        Ok(started) => started,
        Err(err) if err.is_not_found() => {
            debug!("{} does not have started.json, skipping...", build);
            return Ok(None);
        }
        Err(err) if err.is_invalid_document() => {
            debug!("{} has invalid started.json, skipping: {}", build, err);
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let row = BuildRow {
        job: build.job.clone(),
        build_id: build.build_id.clone(),
        started_at: started.timestamp,
        gcs_bucket: build.gcs_bucket.clone(),
        gcs_prefix: build.gcs_prefix.clone(),
    };
    match row.save(db) {
        Ok(()) => {}
        Err(err) if err.is_duplicate() => {
            // Another worker indexed the build first. Benign race.
            debug!("{} was already indexed", build);
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Some(started.timestamp))
}
