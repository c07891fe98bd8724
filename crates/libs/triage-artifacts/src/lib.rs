//! Object store access, raw file cache, and test result parsing.
//!
//! Everything the pipelines need to turn a build's remote artifacts into
//! structured test results:
//!
//! - [`store::ObjectStore`]: the listing/reading boundary to the remote
//!   store, implemented for Google Cloud Storage by [`gcs::GcsClient`].
//! - [`fscache::FsCache`]: a local byte cache that downloads each object at
//!   most once and survives crashes mid-download.
//! - [`client::ArtifactClient`]: build discovery and metadata/result
//!   retrieval on top of the two.
//! - [`junit`]: JUnit XML document parsing.
//! - [`testname`]: environment-annotation stripping for test names.

pub mod client;
pub mod error;
pub mod fscache;
pub mod gcs;
pub mod junit;
pub mod prelude;
pub mod store;
pub mod testname;
pub mod types;

pub use client::ArtifactClient;
pub use gcs::GcsClient;
