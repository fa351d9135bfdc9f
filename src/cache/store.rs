//! Cache store - durable key/value persistence under one resolved root
//!
//! Layout under the cache directory:
//! - `v/<key-path>`  serialized JSON values
//! - `d/<name>/...`  managed free-form directories
//!
//! Values and managed directories live in separate subtrees, so an ad hoc
//! file can never shadow a serialized value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::cache::rootdir::cache_dir_for;
use crate::error::{CacheError, CacheResult};

/// Subtree holding serialized values
const VALUES_SUBDIR: &str = "v";

/// Subtree holding managed directories
const DIRS_SUBDIR: &str = "d";

/// Handle to one on-disk cache directory.
///
/// The store assumes it is the only reader/writer for the duration of one
/// run; there is no locking. Within one process a `set` followed by a `get`
/// on the same key observes the written value.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at an explicit cache directory.
    ///
    /// Nothing is created here; the directory appears lazily on first write.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Open a store for the project containing the given start paths.
    pub fn from_args(args: &[PathBuf]) -> Self {
        Self::new(cache_dir_for(args))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Filesystem path backing the value for `key`.
    ///
    /// There is no guarantee the file exists; missing intermediate
    /// directories are created. The returned path is always inside the
    /// values subtree: keys with absolute, parent-dir, current-dir or empty
    /// segments are structural misuse and rejected up front.
    pub fn value_path(&self, key: &str) -> CacheResult<PathBuf> {
        let mut rel = PathBuf::new();
        let mut segments = 0usize;
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => {
                    segments += 1;
                    rel.push(part);
                }
                _ => {
                    return Err(CacheError::InvalidKey {
                        key: key.to_string(),
                    })
                }
            }
        }
        if segments < 2 {
            return Err(CacheError::InvalidKey {
                key: key.to_string(),
            });
        }
        let path = self.cache_dir.join(VALUES_SUBDIR).join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        Ok(path)
    }

    /// Create (idempotently) a managed directory for free-form files.
    ///
    /// `name` must be exactly one plain path segment, so the directory can
    /// never land outside the `d/` subtree.
    pub fn make_dir(&self, name: &str) -> CacheResult<PathBuf> {
        let mut components = Path::new(name).components();
        let single_plain_segment =
            matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
        if name.contains('/') || !single_plain_segment {
            return Err(CacheError::InvalidName {
                name: name.to_string(),
            });
        }
        let path = self.cache_dir.join(DIRS_SUBDIR).join(name);
        fs::create_dir_all(&path).map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }

    /// Read the value stored under `key`, or `default` if the entry is
    /// absent or cannot be decoded.
    ///
    /// Corruption never fails a run: a broken entry behaves like a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> CacheResult<T> {
        let path = self.value_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(default),
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                trace!(key, "cache-read");
                Ok(value)
            }
            Err(e) => {
                debug!(key, error = %e, "corrupt cache entry, using default");
                Ok(default)
            }
        }
    }

    /// Serialize `value` and overwrite the entry under `key`.
    ///
    /// Returns the number of bytes written. Serialization happens before
    /// anything touches the filesystem, so an unrepresentable value leaves
    /// the on-disk state unchanged.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<u64> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::UnsupportedValue {
            key: key.to_string(),
            source: e,
        })?;
        let path = self.value_path(key)?;
        fs::write(&path, &bytes).map_err(|e| CacheError::io(&path, e))?;
        trace!(key, bytes = bytes.len(), "cache-write");
        Ok(bytes.len() as u64)
    }

    /// Every decodable value entry, in stable path order.
    ///
    /// Entries that fail to decode are skipped, for the same reason `get`
    /// treats them as misses. Purely an introspection surface.
    pub fn iter_entries(&self) -> Vec<(String, Value)> {
        let values_dir = self.cache_dir.join(VALUES_SUBDIR);
        let mut entries = Vec::new();
        for entry in WalkDir::new(&values_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let key = match entry.path().strip_prefix(&values_dir) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            let decoded = fs::read(entry.path())
                .ok()
                .and_then(|bytes| serde_json::from_slice(&bytes).ok());
            match decoded {
                Some(value) => entries.push((key, value)),
                None => debug!(key = %key, "skipping undecodable cache entry"),
            }
        }
        entries
    }

    /// Every file in the managed-directory subtree, with its byte length.
    pub fn iter_managed_files(&self) -> Vec<(String, u64)> {
        let dirs_root = self.cache_dir.join(DIRS_SUBDIR);
        let mut files = Vec::new();
        for entry in WalkDir::new(&dirs_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let key = match entry.path().strip_prefix(&dirs_root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push((key, len));
        }
        files
    }

    /// Remove the entire cache directory.
    ///
    /// The store stays usable afterwards; the directory is recreated lazily
    /// on the next write.
    pub fn clear(&self) -> CacheResult<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)
                .map_err(|e| CacheError::io(&self.cache_dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, CacheStore) {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path().join(".runcache"));
        (temp, store)
    }

    #[test]
    fn test_round_trip_nested_value() {
        let (_temp, store) = store();
        let value = json!({
            "numbers": [1, 2, 3],
            "nested": {"flag": true, "name": "t", "ratio": 0.5},
            "nothing": null,
        });
        store.set("group/name", &value).unwrap();
        let loaded: Value = store.get("group/name", json!("default")).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_miss_returns_default_unchanged() {
        let (_temp, store) = store();
        let got: Vec<i64> = store.get("never/written", vec![7, 8]).unwrap();
        assert_eq!(got, vec![7, 8]);
    }

    #[test]
    fn test_set_then_get_observes_written_value() {
        let (_temp, store) = store();
        store.set("seq/k", &1).unwrap();
        store.set("seq/k", &2).unwrap();
        let got: i64 = store.get("seq/k", 0).unwrap();
        assert_eq!(got, 2);
    }

    #[test]
    fn test_corrupt_entry_behaves_like_miss() {
        let (_temp, store) = store();
        store.set("key/name", &0).unwrap();
        let path = store.value_path("key/name").unwrap();
        fs::write(&path, b"{truncated garbag").unwrap();
        let got: i64 = store.get("key/name", -2).unwrap();
        assert_eq!(got, -2);
    }

    #[test]
    fn test_invalid_key_rejected_everywhere() {
        let (_temp, store) = store();
        assert!(matches!(
            store.value_path("nokey"),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.get::<i64>("nokey", 0),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.set("nokey", &0),
            Err(CacheError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_value_path_stays_under_cache_dir() {
        let (_temp, store) = store();
        let path = store.value_path("group/name").unwrap();
        assert!(path.starts_with(store.cache_dir()));

        // Absolute keys must not replace the cache root.
        let err = store.value_path("/tmp/outside.json").unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
        assert!(matches!(
            store.set("/tmp/outside.json", &1),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(!Path::new("/tmp/outside.json").exists());
    }

    #[test]
    fn test_parent_and_dot_segments_rejected() {
        let (_temp, store) = store();
        for key in ["../escape/x", "a/../../b", "a/..", "./a/b", "a//"] {
            assert!(
                matches!(store.value_path(key), Err(CacheError::InvalidKey { .. })),
                "key {:?} accepted",
                key
            );
        }
    }

    #[test]
    fn test_trailing_separator_key_rejected_immediately() {
        let (_temp, store) = store();
        assert!(matches!(
            store.value_path("a/"),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.set("a/", &1),
            Err(CacheError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_value_path_creates_parents_not_file() {
        let (_temp, store) = store();
        let path = store.value_path("a/b/c").unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_make_dir_idempotent() {
        let (_temp, store) = store();
        let first = store.make_dir("mydb").unwrap();
        assert!(first.is_dir());
        let second = store.make_dir("mydb").unwrap();
        assert_eq!(first, second);
        assert!(second.is_dir());
    }

    #[test]
    fn test_make_dir_rejects_separator() {
        let (_temp, store) = store();
        assert!(matches!(
            store.make_dir("key/name"),
            Err(CacheError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_make_dir_rejects_traversal_names() {
        let (_temp, store) = store();
        for name in ["..", ".", "", "/abs", "name/"] {
            assert!(
                matches!(store.make_dir(name), Err(CacheError::InvalidName { .. })),
                "name {:?} accepted",
                name
            );
        }
    }

    #[test]
    fn test_set_unsupported_value_leaves_disk_unchanged() {
        let (_temp, store) = store();
        // Non-string map keys cannot be represented in the wire format.
        let mut bad: BTreeMap<Vec<u8>, i64> = BTreeMap::new();
        bad.insert(vec![1], 1);
        let err = store.set("key/name", &bad).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedValue { .. }));
        let path = store.value_path("key/name").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_set_reports_bytes_written() {
        let (_temp, store) = store();
        let n = store.set("group/name", &json!([1, 2, 3])).unwrap();
        let path = store.value_path("group/name").unwrap();
        assert_eq!(n, fs::metadata(path).unwrap().len());
    }

    #[test]
    fn test_iter_entries_skips_corrupt_files() {
        let (_temp, store) = store();
        store.set("a/one", &json!(1)).unwrap();
        store.set("b/two", &json!([2])).unwrap();
        let bad = store.value_path("c/bad").unwrap();
        fs::write(&bad, b"\x00\x01not json").unwrap();

        let entries = store.iter_entries();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a/one", "b/two"]);
        assert_eq!(entries[1].1, json!([2]));
    }

    #[test]
    fn test_iter_entries_empty_when_no_cache() {
        let (_temp, store) = store();
        assert!(store.iter_entries().is_empty());
        assert!(store.iter_managed_files().is_empty());
    }

    #[test]
    fn test_clear_removes_cache_dir() {
        let (_temp, store) = store();
        store.set("group/name", &1).unwrap();
        store.make_dir("mydb").unwrap();
        assert!(store.cache_dir().exists());
        store.clear().unwrap();
        assert!(!store.cache_dir().exists());
        // Writable again after a wipe.
        store.set("group/name", &2).unwrap();
        let got: i64 = store.get("group/name", 0).unwrap();
        assert_eq!(got, 2);
    }

    #[test]
    fn test_clear_on_missing_dir_is_ok() {
        let (_temp, store) = store();
        store.clear().unwrap();
    }
}
