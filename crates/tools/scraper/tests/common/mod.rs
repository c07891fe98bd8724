#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use triage_artifacts::error::Error as ArtifactError;
use triage_artifacts::store::{Listing, ObjectStore};
use triage_models::db::{config::DbConfig, connection::DbConnection};

type StoreResult<T> = Result<T, ArtifactError>;

/// In-memory object store shared between the test and the pipelines.
/// Clones see the same objects and the same read log.
#[derive(Clone)]
pub struct MemoryStore {
    objects: Arc<BTreeMap<String, Vec<u8>>>,
    reads: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub fn new(objects: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            objects: Arc::new(objects.into_iter().collect()),
            reads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Object paths read so far, in order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl ObjectStore for MemoryStore {
    async fn list_dir(&self, _bucket: &str, prefix: &str) -> StoreResult<Listing> {
        let mut dirs = BTreeSet::new();
        let mut files = Vec::new();
        for name in self.objects.keys() {
            let Some(rest) = name.strip_prefix(prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((head, _)) => {
                    dirs.insert(format!("{prefix}{head}/"));
                }
                None => files.push(name.clone()),
            }
        }
        Ok(Listing {
            dirs: dirs.into_iter().collect(),
            files,
        })
    }

    async fn list_all(&self, _bucket: &str, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn read(&self, bucket: &str, object: &str) -> StoreResult<Vec<u8>> {
        self.reads.lock().unwrap().push(object.to_string());
        self.objects
            .get(object)
            .cloned()
            .ok_or_else(|| ArtifactError::ObjectNotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            })
    }
}

pub fn test_db(dir: &TempDir) -> DbConnection {
    let url = dir.path().join("index.db");
    DbConnection::new(&DbConfig::new(url.to_str().unwrap()))
        .unwrap()
        .setup()
        .unwrap()
}
