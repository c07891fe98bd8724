//! Raw file cache: one local blob per remote object.

use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::prelude::*;

const TMP_SUFFIX: &str = ".part";

/// Caches remote objects as files under one directory, keyed by
/// `bucket/object` paths.
///
/// Population is crash safe: bytes land in a `.part` sibling first and are
/// renamed into place only after a complete write, so a reader never sees a
/// partial entry and concurrent workers racing on a key at worst duplicate
/// the fetch.
pub struct FsCache {
    dir: PathBuf,
}

impl FsCache {
    /// Create a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Return the cached bytes for `key`, fetching and persisting them
    /// first if absent. `fetch` is invoked only on a cache miss.
    pub async fn open<F, Fut>(&self, key: &str, fetch: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        let path = self.path_for(key);

        match fs::read(&path) {
            Ok(buf) => {
                debug!("Found {} in cache", key);
                return Ok(buf);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let buf = fetch().await?;
        self.persist(&path, &buf)?;
        Ok(buf)
    }

    fn persist(&self, path: &Path, buf: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = PathBuf::from(format!("{}{}", path.display(), TMP_SUFFIX));
        let written = fs::File::create(&tmp_path).and_then(|mut file| {
            file.write_all(buf)?;
            file.sync_all()
        });
        if let Err(err) = written {
            // Best effort cleanup
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Remove every cached entry below `prefix`. The prefix must be
    /// non-empty and end with `/`; removing an absent subtree is not an
    /// error.
    pub fn delete_by_prefix(&self, prefix: &str) -> Result<()> {
        if !prefix.ends_with('/') || prefix.len() == 1 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot delete {prefix:?}: prefix must be non-empty and end with /"),
            )
            .into());
        }

        let path = self.path_for(prefix.trim_end_matches('/'));
        debug!("Deleting {}...", path.display());
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
