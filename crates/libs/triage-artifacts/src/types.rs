//! Build and test result types shared by the pipelines.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One execution of a CI job, addressed by its object-store location.
/// Immutable once discovered; `(job, build_id)` identifies it globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Build group name.
    pub job: String,
    /// Build identifier within the group.
    pub build_id: String,
    /// Bucket holding the build's files.
    pub gcs_bucket: String,
    /// Object path prefix of the build's files, ending with `/`.
    pub gcs_prefix: String,
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} (gs://{}/{})",
            self.job, self.build_id, self.gcs_bucket, self.gcs_prefix
        )
    }
}

/// A build plus the point-in-time snapshot of object paths under its
/// prefix. Never refreshed once taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFiles {
    /// The build the listing belongs to.
    pub build: Build,
    /// Absolute object paths under the build's prefix.
    pub files: BTreeSet<String>,
}

impl BuildFiles {
    /// Whether `filename`, relative to the build's prefix, is in the
    /// listing.
    pub fn has(&self, filename: &str) -> bool {
        self.files
            .contains(&format!("{}{}", self.build.gcs_prefix, filename))
    }
}

/// The build's started record, one of the two well-known metadata
/// documents. A build without one is not indexable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedRecord {
    /// Start time as a unix timestamp.
    #[serde(default)]
    pub timestamp: i64,
}

/// The build's finished record. A corrupt document degrades to the default
/// value instead of failing the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedRecord {
    /// Finish time as a unix timestamp.
    #[serde(default)]
    pub timestamp: i64,
    /// Terminal result, e.g. `"SUCCESS"` or `"FAILURE"`.
    #[serde(default)]
    pub result: String,
}

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Success,
    Failure,
    Error,
    Skipped,
}

/// One test case from a parsed result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name as reported, before normalization.
    pub test: String,
    /// Outcome of this run.
    pub status: TestStatus,
    /// Full captured output.
    pub output: String,
    /// Bounded failure/skip message.
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> Build {
        Build {
            job: "periodic-unit".to_string(),
            build_id: "100".to_string(),
            gcs_bucket: "example-bucket".to_string(),
            gcs_prefix: "logs/periodic-unit/100/".to_string(),
        }
    }

    #[test]
    fn display_includes_location() {
        assert_eq!(
            build().to_string(),
            "periodic-unit @ 100 (gs://example-bucket/logs/periodic-unit/100/)"
        );
    }

    #[test]
    fn has_resolves_against_the_prefix() {
        let files = BuildFiles {
            build: build(),
            files: ["logs/periodic-unit/100/finished.json".to_string()]
                .into_iter()
                .collect(),
        };
        assert!(files.has("finished.json"));
        assert!(!files.has("started.json"));
    }
}
