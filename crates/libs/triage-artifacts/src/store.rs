//! The boundary to the remote object store.

use std::future::Future;

use crate::prelude::*;

/// One page-merged delimiter listing: immediate subdirectories and files.
#[derive(Debug, Default, Clone)]
pub struct Listing {
    /// Subdirectory prefixes, each ending with `/`.
    pub dirs: Vec<String>,
    /// Object paths directly under the listed prefix.
    pub files: Vec<String>,
}

/// List/read operations against a bucket+prefix address space.
///
/// Implementations must return [`Error::ObjectNotFound`] from [`read`] for a
/// missing object, distinguished from every other failure.
///
/// [`read`]: ObjectStore::read
pub trait ObjectStore: Send + Sync {
    /// List immediate subdirectories and files under `prefix`.
    fn list_dir(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> impl Future<Output = Result<Listing>> + Send;

    /// List every object under `prefix`, recursively.
    fn list_all(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Read one object in full.
    fn read(&self, bucket: &str, object: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
