//! Error types for the cache store
//!
//! Structural misuse of keys and directory names is a bug in the calling
//! collaborator and surfaces immediately. Filesystem faults propagate
//! untouched. Corrupt on-disk entries are deliberately not represented here:
//! the store downgrades them to a cache miss so stale data can never abort a
//! test run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors the cache store can raise
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value keys are namespaced: a prefix segment followed by at least one
    /// more segment, e.g. `runcache/lastfailed`.
    #[error("invalid cache key {key:?}: must be of the form 'prefix/.../name'")]
    InvalidKey { key: String },

    /// Managed directories are flat, a single path segment.
    #[error("invalid cache directory name {name:?}: must not contain '/'")]
    InvalidName { name: String },

    /// `set` was called with a value the wire format cannot represent.
    /// The on-disk state is left unchanged.
    #[error("cannot serialize value for cache key {key:?}: {source}")]
    UnsupportedValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
