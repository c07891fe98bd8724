//! Build discovery and artifact retrieval on top of the store and cache.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::fscache::FsCache;
use crate::junit;
use crate::prelude::*;
use crate::store::ObjectStore;
use crate::types::{Build, BuildFiles, FinishedRecord, StartedRecord, TestResult};

static JUNIT_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/junit.*\.xml$").expect("valid regex"));

/// Retrieves build metadata and test results, serving every object read
/// through the raw file cache.
pub struct ArtifactClient<S> {
    store: S,
    cache: FsCache,
}

impl<S: ObjectStore> ArtifactClient<S> {
    /// Create a client caching downloads under `cache_dir`.
    pub fn new(store: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            cache: FsCache::new(cache_dir),
        }
    }

    /// The raw file cache, keyed by `bucket/object`.
    pub fn cache(&self) -> &FsCache {
        &self.cache
    }

    async fn open(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        let key = format!("{}/{}", bucket, object);
        self.cache
            .open(&key, || self.store.read(bucket, object))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, bucket: &str, object: &str) -> Result<T> {
        let buf = self.open(bucket, object).await?;
        serde_json::from_slice(&buf).map_err(|source| Error::InvalidDocument {
            bucket: bucket.to_string(),
            object: object.to_string(),
            source,
        })
    }

    /// List the builds of one group. The group's prefix is `bucket/path/`;
    /// each immediate subdirectory of the path is one build, named by the
    /// directory.
    ///
    /// The store lists lexicographically, so the result is oldest-first.
    pub async fn find_builds(&self, name: &str, gcs_prefix: &str) -> Result<Vec<Build>> {
        let mut gcs_prefix = gcs_prefix.to_string();
        if !gcs_prefix.ends_with('/') {
            gcs_prefix.push('/');
        }
        let (bucket, prefix) = gcs_prefix.split_once('/').ok_or_else(|| Error::InvalidPrefix {
            group: name.to_string(),
            prefix: gcs_prefix.clone(),
        })?;

        info!("Searching for {} builds (gs://{}/{})...", name, bucket, prefix);

        let listing = self.store.list_dir(bucket, prefix).await?;

        let mut builds = Vec::with_capacity(listing.dirs.len());
        for dir in listing.dirs {
            let build_id = dir
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix('/'))
                .filter(|id| !id.is_empty())
                .ok_or_else(|| Error::UnexpectedObject {
                    prefix: prefix.to_string(),
                    object: dir.clone(),
                })?
                .to_string();
            builds.push(Build {
                job: name.to_string(),
                build_id,
                gcs_bucket: bucket.to_string(),
                gcs_prefix: dir,
            });
        }
        Ok(builds)
    }

    /// Take the point-in-time listing of every object under the build's
    /// prefix.
    pub async fn get_build_files(&self, build: &Build) -> Result<BuildFiles> {
        let files: BTreeSet<String> = self
            .store
            .list_all(&build.gcs_bucket, &build.gcs_prefix)
            .await?
            .into_iter()
            .collect();
        Ok(BuildFiles {
            build: build.clone(),
            files,
        })
    }

    /// Fetch and decode the build's started record.
    pub async fn get_started(&self, build: &Build) -> Result<StartedRecord> {
        let object = format!("{}started.json", build.gcs_prefix);
        self.get_json(&build.gcs_bucket, &object).await
    }

    /// Fetch and decode the build's finished record.
    pub async fn get_finished(&self, build: &Build) -> Result<FinishedRecord> {
        let object = format!("{}finished.json", build.gcs_prefix);
        self.get_json(&build.gcs_bucket, &object).await
    }

    /// Fetch and parse every JUnit result document in the listing. A
    /// document that fails to parse is skipped with a warning; one bad file
    /// must not lose the rest of the build's results.
    pub async fn get_test_results(&self, build_files: &BuildFiles) -> Result<Vec<TestResult>> {
        let bucket = &build_files.build.gcs_bucket;

        let mut results = Vec::new();
        for object in &build_files.files {
            if !JUNIT_OBJECT_RE.is_match(object) {
                continue;
            }
            let buf = self.open(bucket, object).await?;
            match junit::parse_document(&buf) {
                Ok(mut parsed) => results.append(&mut parsed),
                Err(err) => {
                    warn!("Unable to parse gs://{}/{}: {}", bucket, object, err);
                }
            }
        }

        debug!(
            "Collected {} test results for {}",
            results.len(),
            build_files.build
        );
        Ok(results)
    }
}
