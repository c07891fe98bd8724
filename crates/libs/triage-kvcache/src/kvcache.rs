//! The cache itself: JSON + gzip values addressed by string keys.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::prelude::*;

const TMP_SUFFIX: &str = ".part";

/// A key/value cache persisted under one directory. Keys may contain `/`
/// and map directly to paths below the cache directory.
pub struct KvCache {
    dir: PathBuf,
}

impl KvCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Serialize, compress, and atomically persist `value` under `key`.
    ///
    /// Keys ending with the reserved temporary suffix are rejected: a value
    /// saved under such a key could be destroyed by another save's cleanup.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        debug!("Saving {} in cache...", key);

        if key.ends_with(TMP_SUFFIX) {
            return Err(Error::ReservedSuffix {
                key: key.to_string(),
                suffix: TMP_SUFFIX,
            });
        }

        let buf = serde_json::to_vec(value)?;

        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = PathBuf::from(format!("{}{}", path.display(), TMP_SUFFIX));
        let file = fs::File::create(&tmp_path)?;

        let mut encoder = GzEncoder::new(file, Compression::default());
        let written = encoder
            .write_all(&buf)
            .and_then(|_| encoder.finish())
            .and_then(|file| file.sync_all());
        if let Err(err) = written {
            // Best effort cleanup
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load and decode the value under `key`. Fails with
    /// [`Error::NotFound`] if nothing is cached.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.path_for(key);

        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound {
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        debug!("Found {} in cache", key);

        let decoder = GzDecoder::new(file);
        Ok(serde_json::from_reader(decoder)?)
    }

    /// Remove the value under `key`. Removing a missing key is not an
    /// error.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);

        debug!("Deleting {}...", path.display());
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Analysis {
        started: i64,
        result: String,
    }

    fn sample() -> Analysis {
        Analysis {
            started: 100,
            result: "SUCCESS".to_string(),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = KvCache::new(dir.path());

        cache.save("periodic-unit/100", &sample()).unwrap();
        let loaded: Analysis = cache.load("periodic-unit/100").unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn load_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = KvCache::new(dir.path());

        let err = cache.load::<Analysis>("periodic-unit/100").unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    }

    #[test]
    fn reserved_suffix_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cache = KvCache::new(dir.path());

        let err = cache.save("periodic-unit/100.part", &sample()).unwrap_err();
        assert!(matches!(err, Error::ReservedSuffix { .. }));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = KvCache::new(dir.path());

        cache.save("periodic-unit/100", &sample()).unwrap();
        cache.delete("periodic-unit/100").unwrap();
        cache.delete("periodic-unit/100").unwrap();

        assert!(cache.load::<Analysis>("periodic-unit/100").unwrap_err().is_not_found());
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let cache = KvCache::new(dir.path());

        cache.save("periodic-unit/100", &sample()).unwrap();
        assert!(!dir.path().join("periodic-unit/100.part").exists());
        assert!(dir.path().join("periodic-unit/100").exists());
    }
}
