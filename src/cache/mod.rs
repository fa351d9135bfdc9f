//! Cache module - persistent cross-run storage under `.runcache/`
//!
//! Provides:
//! - Project-root discovery for locating the cache directory
//! - The key/value store with managed free-form directories
//! - Human-readable dumping of cache contents

pub mod rootdir;
pub mod show;
pub mod store;
