use std::collections::BTreeSet;

use tempfile::TempDir;
use triage_models::build::build::BuildRow;
use triage_models::build::build_files::BuildFilesRow;
use triage_models::db::{config::DbConfig, connection::DbConnection};
use triage_models::error::Error;

fn test_db() -> (TempDir, DbConnection) {
    let dir = TempDir::new().unwrap();
    let url = dir.path().join("index.db");
    let db = DbConnection::new(&DbConfig::new(url.to_str().unwrap()))
        .unwrap()
        .setup()
        .unwrap();
    (dir, db)
}

fn build(job: &str, build_id: &str, started_at: i64) -> BuildRow {
    BuildRow {
        job: job.to_string(),
        build_id: build_id.to_string(),
        started_at,
        gcs_bucket: "example-bucket".to_string(),
        gcs_prefix: format!("logs/{job}/{build_id}/"),
    }
}

#[test]
fn save_and_fetch_build() {
    let (_dir, db) = test_db();

    build("periodic-unit", "100", 1000).save(&db).unwrap();

    let row = BuildRow::fetch("periodic-unit", "100", &db).unwrap();
    assert_eq!(row.started_at, 1000);
    assert_eq!(row.gcs_prefix, "logs/periodic-unit/100/");
}

#[test]
fn fetch_missing_build_is_not_found() {
    let (_dir, db) = test_db();

    let err = BuildRow::fetch("periodic-unit", "100", &db).unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

#[test]
fn save_duplicate_build_fails() {
    let (_dir, db) = test_db();

    build("periodic-unit", "100", 1000).save(&db).unwrap();
    let err = build("periodic-unit", "100", 1000).save(&db).unwrap_err();
    assert!(err.is_duplicate(), "expected Duplicate, got {err:?}");
}

#[test]
fn range_queries_partition_at_the_boundary() {
    let (_dir, db) = test_db();

    for (id, ts) in [("1", 50), ("2", 75), ("3", 100)] {
        build("periodic-unit", id, ts).save(&db).unwrap();
    }

    let after = BuildRow::fetch_started_after(75, &db).unwrap();
    let before = BuildRow::fetch_started_before(75, &db).unwrap();

    let after_ids: BTreeSet<_> = after.iter().map(|b| b.build_id.as_str()).collect();
    let before_ids: BTreeSet<_> = before.iter().map(|b| b.build_id.as_str()).collect();

    assert_eq!(after_ids, BTreeSet::from(["2", "3"]));
    assert_eq!(before_ids, BTreeSet::from(["1"]));
    assert_eq!(after.len() + before.len(), 3);
}

#[test]
fn delete_build_is_idempotent() {
    let (_dir, db) = test_db();

    build("periodic-unit", "100", 1000).save(&db).unwrap();
    BuildRow::delete("periodic-unit", "100", &db).unwrap();
    BuildRow::delete("periodic-unit", "100", &db).unwrap();

    assert!(BuildRow::fetch("periodic-unit", "100", &db).unwrap_err().is_not_found());
}

#[test]
fn build_files_round_trip() {
    let (_dir, db) = test_db();

    let files: BTreeSet<String> = [
        "logs/periodic-unit/100/started.json",
        "logs/periodic-unit/100/finished.json",
        "logs/periodic-unit/100/artifacts/junit_01.xml",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    BuildFilesRow::create("periodic-unit", "100", &files)
        .unwrap()
        .save(&db)
        .unwrap();

    let row = BuildFilesRow::fetch("periodic-unit", "100", &db).unwrap();
    assert_eq!(row.file_set().unwrap(), files);

    let err = BuildFilesRow::create("periodic-unit", "100", &files)
        .unwrap()
        .save(&db)
        .unwrap_err();
    assert!(matches!(err, Error::Duplicate));

    BuildFilesRow::delete("periodic-unit", "100", &db).unwrap();
    assert!(
        BuildFilesRow::fetch("periodic-unit", "100", &db)
            .unwrap_err()
            .is_not_found()
    );
}
