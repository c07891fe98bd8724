//! Export pipeline: aggregate cached build data into triage reports.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use triage_artifacts::ArtifactClient;
use triage_artifacts::store::ObjectStore;
use triage_artifacts::testname;
use triage_artifacts::types::{Build, BuildFiles, FinishedRecord, StartedRecord, TestResult, TestStatus};
use triage_kvcache::KvCache;
use triage_models::build::build::BuildRow;
use triage_models::build::build_files::BuildFilesRow;
use triage_models::db::connection::DbConnection;

use crate::pool::process_all;
use crate::prelude::*;

/// Export run parameters. Each output file is optional; an exporter without
/// a path discards its stream.
pub struct ExportOptions {
    /// Builds report, one JSON array sorted by `(job, number)`.
    pub builds: Option<PathBuf>,
    /// Failures report, newline-delimited JSON.
    pub tests: Option<PathBuf>,
    /// Per-test summary report, one JSON object.
    pub summary: Option<PathBuf>,
    /// Worker pool size; builds are analyzed concurrently.
    pub num_workers: usize,
    /// Export only builds with `started_at >= created_after`; 0 disables
    /// the window.
    pub created_after: i64,
}

/// Everything needed to re-export one build without touching the store.
/// Cached under `job/build_id` in the value cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildData {
    pub started: StartedRecord,
    pub finished: FinishedRecord,
    pub test_results: Vec<TestResult>,
}

/// Run counts of one normalized test name within one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStats {
    pub succeed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub error: usize,
}

/// Per-test outcome of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Succeeded,
    Failed,
    Flaked,
    Skipped,
}

/// Classify one test's runs within a build. Errors count as failures. A
/// failing test is flaked rather than failed when it also succeeded in the
/// same build, or when the build as a whole succeeded.
pub fn classify(stats: &TestStats, build_result: &str) -> Result<TestOutcome> {
    if stats.failed > 0 || stats.error > 0 {
        if stats.succeed > 0 || build_result == "SUCCESS" {
            Ok(TestOutcome::Flaked)
        } else {
            Ok(TestOutcome::Failed)
        }
    } else if stats.succeed > 0 {
        Ok(TestOutcome::Succeeded)
    } else if stats.skipped > 0 {
        Ok(TestOutcome::Skipped)
    } else {
        Err(Error::Internal(format!(
            "test stats with no recorded runs: {stats:?}"
        )))
    }
}

#[derive(Debug, Serialize)]
struct JsonBuild {
    path: String,
    started: String,
    elapsed: String,
    tests_run: String,
    tests_failed: String,
    job: String,
    number: String,
    result: String,
}

#[derive(Debug, Serialize)]
struct JsonFailure {
    started: String,
    #[serde(rename = "build")]
    path: String,
    name: String,
    failure_text: String,
}

#[derive(Debug, Default, Serialize)]
struct JsonTestStats {
    succeed: Vec<String>,
    failed: Vec<String>,
    flaked: Vec<String>,
    skipped: Vec<String>,
}

/// Per-build aggregate handed to the summary exporter.
struct BuildSummary {
    job: String,
    build_id: String,
    result: String,
    test_stats: BTreeMap<String, TestStats>,
}

/// Analyze every indexed build in the window and write the configured
/// reports.
pub async fn run<S: ObjectStore + 'static>(
    opts: ExportOptions,
    db: DbConnection,
    client: Arc<ArtifactClient<S>>,
    kvcache: Arc<KvCache>,
) -> Result<()> {
    let rows = BuildRow::fetch_started_after(opts.created_after, &db)?;
    info!("Found {} builds", rows.len());

    let (builds_tx, builds_rx) = mpsc::unbounded_channel();
    let (failures_tx, failures_rx) = mpsc::unbounded_channel();
    let (summaries_tx, summaries_rx) = mpsc::unbounded_channel();

    let builds_exporter = tokio::spawn(builds_exporter(opts.builds, builds_rx));
    let failures_exporter = tokio::spawn(failures_exporter(opts.tests, failures_rx));
    let summary_exporter = tokio::spawn(summary_exporter(opts.summary, summaries_rx));

    // The handler owns the only senders; once the pool is joined they are
    // gone and the exporters see their channels close.
    let pool_result = process_all(rows, opts.num_workers, move |row| {
        let db = db.clone();
        let client = Arc::clone(&client);
        let kvcache = Arc::clone(&kvcache);
        let builds_tx = builds_tx.clone();
        let failures_tx = failures_tx.clone();
        let summaries_tx = summaries_tx.clone();
        async move {
            handle_build(
                &row,
                &db,
                &client,
                &kvcache,
                &builds_tx,
                &failures_tx,
                &summaries_tx,
            )
            .await
        }
    })
    .await;

    let builds_result = builds_exporter.await?;
    let failures_result = failures_exporter.await?;
    let summary_result = summary_exporter.await?;

    pool_result
        .and(builds_result)
        .and(failures_result)
        .and(summary_result)
}

fn to_build(row: &BuildRow) -> Build {
    Build {
        job: row.job.clone(),
        build_id: row.build_id.clone(),
        gcs_bucket: row.gcs_bucket.clone(),
        gcs_prefix: row.gcs_prefix.clone(),
    }
}

fn send<T>(tx: &mpsc::UnboundedSender<T>, value: T, exporter: &str) -> Result<()> {
    tx.send(value)
        .map_err(|_| Error::Internal(format!("{exporter} exporter stopped unexpectedly")))
}

async fn handle_build<S: ObjectStore>(
    row: &BuildRow,
    db: &DbConnection,
    client: &ArtifactClient<S>,
    kvcache: &KvCache,
    builds_tx: &mpsc::UnboundedSender<JsonBuild>,
    failures_tx: &mpsc::UnboundedSender<JsonFailure>,
    summaries_tx: &mpsc::UnboundedSender<BuildSummary>,
) -> Result<()> {
    let build = to_build(row);
    debug!("Analyzing {}...", build);

    let Some(data) = get_build_data(&build, db, client, kvcache).await? else {
        return Ok(());
    };

    let path = format!(
        "{}/{}",
        build.gcs_bucket,
        build.gcs_prefix.trim_end_matches('/')
    );

    let mut test_stats: BTreeMap<String, TestStats> = BTreeMap::new();
    let mut tests_run: usize = 0;
    let mut tests_failed: usize = 0;

    for result in &data.test_results {
        let stats = test_stats
            .entry(testname::normalize(&result.test))
            .or_default();

        match result.status {
            TestStatus::Success => {
                tests_run += 1;
                stats.succeed += 1;
            }
            TestStatus::Failure => {
                tests_run += 1;
                tests_failed += 1;
                stats.failed += 1;

                // The full failure text is often pages of log; the report
                // carries everything up to the first blank line.
                let failure_text = match result.summary.find("\n\n") {
                    Some(idx) => &result.summary[..idx],
                    None => result.summary.as_str(),
                };
                send(
                    failures_tx,
                    JsonFailure {
                        started: data.started.timestamp.to_string(),
                        path: path.clone(),
                        name: result.test.clone(),
                        failure_text: failure_text.to_string(),
                    },
                    "failures",
                )?;
            }
            TestStatus::Skipped => stats.skipped += 1,
            TestStatus::Error => stats.error += 1,
        }
    }

    send(
        builds_tx,
        JsonBuild {
            path,
            started: data.started.timestamp.to_string(),
            elapsed: (data.finished.timestamp - data.started.timestamp).to_string(),
            tests_run: tests_run.to_string(),
            tests_failed: tests_failed.to_string(),
            job: build.job.clone(),
            number: build.build_id.clone(),
            result: data.finished.result.clone(),
        },
        "builds",
    )?;

    send(
        summaries_tx,
        BuildSummary {
            job: build.job,
            build_id: build.build_id,
            result: data.finished.result,
            test_stats,
        },
        "summary",
    )?;

    Ok(())
}

/// Load the build's data from the value cache, assembling and caching it on
/// a miss. `None` means the build is incomplete and has nothing to export.
async fn get_build_data<S: ObjectStore>(
    build: &Build,
    db: &DbConnection,
    client: &ArtifactClient<S>,
    kvcache: &KvCache,
) -> Result<Option<BuildData>> {
    let key = format!("{}/{}", build.job, build.build_id);
    match kvcache.load(&key) {
        Ok(data) => return Ok(Some(data)),
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err.into()),
    }

    let Some(data) = create_build_data(build, db, client).await? else {
        return Ok(None);
    };
    kvcache.save(&key, &data)?;
    Ok(Some(data))
}

async fn create_build_data<S: ObjectStore>(
    build: &Build,
    db: &DbConnection,
    client: &ArtifactClient<S>,
) -> Result<Option<BuildData>> {
    debug!("Getting data for {}...", build);

    let build_files = match BuildFilesRow::fetch(&build.job, &build.build_id, db) {
        Ok(row) => BuildFiles {
            build: build.clone(),
            files: row.file_set()?,
        },
        Err(err) if err.is_not_found() => {
            let build_files = client.get_build_files(build).await?;

            // Incomplete builds are skipped without caching anything, so a
            // later run sees them once they finish.
            if !build_files.has("finished.json") {
                debug!("{} does not have finished.json, skipping...", build);
                return Ok(None);
            }

            let row = BuildFilesRow::create(
                build.job.as_str(),
                build.build_id.as_str(),
                &build_files.files,
            )?;
            match row.save(db) {
                Ok(()) => {}
                Err(err) if err.is_duplicate() => {
                    // Another worker saved the listing first. Benign race.
                    debug!("{} listing was already saved", build);
                }
                Err(err) => return Err(err.into()),
            }
            build_files
        }
        Err(err) => return Err(err.into()),
    };

    let started = client.get_started(build).await?;

    let finished = match client.get_finished(build).await {
        Ok(finished) => finished,
        Err(err) if err.is_invalid_document() => {
            warn!("{} has corrupted finished.json: {}", build, err);
            FinishedRecord::default()
        }
        Err(err) => return Err(err.into()),
    };

    let test_results = client.get_test_results(&build_files).await?;

    Ok(Some(BuildData {
        started,
        finished,
        test_results,
    }))
}

async fn builds_exporter(
    path: Option<PathBuf>,
    mut rx: mpsc::UnboundedReceiver<JsonBuild>,
) -> Result<()> {
    let Some(path) = path else {
        while rx.recv().await.is_some() {}
        return Ok(());
    };

    let mut rows = Vec::new();
    while let Some(build) = rx.recv().await {
        rows.push(build);
        if rows.len() % 1000 == 0 {
            info!("Processed {} builds", rows.len());
        }
    }
    info!("Processed {} builds", rows.len());

    // Workers race, so arrival order is nondeterministic.
    rows.sort_by(|a, b| (a.job.as_str(), a.number.as_str()).cmp(&(b.job.as_str(), b.number.as_str())));

    let mut writer = BufWriter::new(fs::File::create(&path)?);
    serde_json::to_writer(&mut writer, &rows)?;
    writer.flush()?;
    Ok(())
}

async fn failures_exporter(
    path: Option<PathBuf>,
    mut rx: mpsc::UnboundedReceiver<JsonFailure>,
) -> Result<()> {
    let Some(path) = path else {
        while rx.recv().await.is_some() {}
        return Ok(());
    };

    let mut writer = BufWriter::new(fs::File::create(&path)?);
    while let Some(failure) = rx.recv().await {
        serde_json::to_writer(&mut writer, &failure)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

async fn summary_exporter(
    path: Option<PathBuf>,
    mut rx: mpsc::UnboundedReceiver<BuildSummary>,
) -> Result<()> {
    let Some(path) = path else {
        while rx.recv().await.is_some() {}
        return Ok(());
    };

    let mut summary: BTreeMap<String, BTreeMap<String, JsonTestStats>> = BTreeMap::new();
    while let Some(bs) = rx.recv().await {
        for (test, stats) in &bs.test_stats {
            let job_stats = summary
                .entry(test.clone())
                .or_default()
                .entry(bs.job.clone())
                .or_default();
            let ids = match classify(stats, &bs.result)? {
                TestOutcome::Succeeded => &mut job_stats.succeed,
                TestOutcome::Failed => &mut job_stats.failed,
                TestOutcome::Flaked => &mut job_stats.flaked,
                TestOutcome::Skipped => &mut job_stats.skipped,
            };
            ids.push(bs.build_id.clone());
        }
    }

    for job_stats in summary.values_mut().flat_map(|jobs| jobs.values_mut()) {
        job_stats.succeed.sort();
        job_stats.failed.sort();
        job_stats.flaked.sort();
        job_stats.skipped.sort();
    }

    let mut writer = BufWriter::new(fs::File::create(&path)?);
    serde_json::to_writer(&mut writer, &summary)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(succeed: usize, failed: usize, skipped: usize, error: usize) -> TestStats {
        TestStats {
            succeed,
            failed,
            skipped,
            error,
        }
    }

    #[test]
    fn failure_in_a_failed_build_is_failed() {
        assert_eq!(
            classify(&stats(0, 1, 0, 0), "FAILURE").unwrap(),
            TestOutcome::Failed
        );
        assert_eq!(
            classify(&stats(0, 0, 0, 1), "FAILURE").unwrap(),
            TestOutcome::Failed
        );
    }

    #[test]
    fn failure_with_a_success_is_flaked() {
        assert_eq!(
            classify(&stats(1, 1, 0, 0), "FAILURE").unwrap(),
            TestOutcome::Flaked
        );
    }

    #[test]
    fn failure_in_a_successful_build_is_flaked() {
        assert_eq!(
            classify(&stats(0, 1, 0, 0), "SUCCESS").unwrap(),
            TestOutcome::Flaked
        );
    }

    #[test]
    fn success_and_skips_without_failures() {
        assert_eq!(
            classify(&stats(2, 0, 0, 0), "SUCCESS").unwrap(),
            TestOutcome::Succeeded
        );
        assert_eq!(
            classify(&stats(1, 0, 1, 0), "SUCCESS").unwrap(),
            TestOutcome::Succeeded
        );
        assert_eq!(
            classify(&stats(0, 0, 1, 0), "SUCCESS").unwrap(),
            TestOutcome::Skipped
        );
    }

    #[test]
    fn empty_stats_are_an_internal_error() {
        let err = classify(&stats(0, 0, 0, 0), "SUCCESS").unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
