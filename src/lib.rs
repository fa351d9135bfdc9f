//! runcache - cross-run result cache and last-failed selection for test harnesses
//!
//! runcache provides:
//! - A persistent key/value cache scoped to a discovered project root
//! - Managed free-form directories for ad hoc cross-run files
//! - A last-failed selector that filters a test collection down to the
//!   tests that failed in the previous run

pub mod cache;
pub mod cli;
pub mod error;
pub mod lastfailed;

pub use cache::store::CacheStore;
pub use error::{CacheError, CacheResult};
pub use lastfailed::{LastFailedSelector, Outcome, LASTFAILED_KEY};
