//! Project root discovery
//!
//! The cache lives in a fixed dot-directory under the project root. The root
//! is found by walking upward from the invocation paths toward the first
//! ancestor carrying a recognized project marker file, the same way test
//! runners locate their configuration.

use std::path::PathBuf;
use tracing::{trace, warn};

/// Marker filenames that identify a project root, in match priority order.
pub const ROOT_MARKERS: &[&str] = &[
    "Cargo.toml",
    "pyproject.toml",
    "package.json",
    "setup.py",
    "tox.ini",
];

/// Name of the cache subdirectory under the resolved root.
pub const CACHE_DIR_NAME: &str = ".runcache";

/// Resolve the project root from the given start paths.
///
/// Each start path is searched outward through its ancestors (the path
/// itself first, arguments in order); the first directory containing one of
/// [`ROOT_MARKERS`] wins. With no start paths the current directory is
/// searched. If nothing matches anywhere, the current directory is used and
/// a warning is emitted.
pub fn resolve_rootdir(args: &[PathBuf]) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let starts: Vec<PathBuf> = if args.is_empty() {
        vec![cwd.clone()]
    } else {
        args.to_vec()
    };

    for start in &starts {
        // Joining a marker onto a file path never matches, so a file start
        // path effectively searches from its parent chain.
        let start = start.canonicalize().unwrap_or_else(|_| start.clone());
        for dir in start.ancestors() {
            for marker in ROOT_MARKERS {
                if dir.join(marker).is_file() {
                    trace!(root = %dir.display(), marker, "resolved project root");
                    return dir.to_path_buf();
                }
            }
        }
    }

    warn!("no project root marker found, using {}", cwd.display());
    cwd
}

/// The cache directory for the project containing the given start paths.
///
/// Resolved once by the caller and carried in a [`CacheStore`]; nothing in
/// this crate keeps it as ambient state.
///
/// [`CacheStore`]: crate::cache::store::CacheStore
pub fn cache_dir_for(args: &[PathBuf]) -> PathBuf {
    resolve_rootdir(args).join(CACHE_DIR_NAME)
}
