//! Last-failed selection - persist failing test ids across runs
//!
//! The selector reads the previous run's failing set at startup, filters the
//! collected tests when rerun-mode is on, and writes this run's failures back
//! at session end regardless of mode so the next rerun has fresh data.

use std::collections::BTreeSet;
use tracing::trace;

use crate::cache::store::CacheStore;
use crate::error::CacheResult;

/// Cache key the failing set is persisted under.
pub const LASTFAILED_KEY: &str = "runcache/lastfailed";

/// Terminal status of one test, as reported by the host harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    /// A skip is not a failure: skipped tests never enter the failing set,
    /// so they drop out of the next rerun scope.
    Skipped,
}

/// Filters a test collection down to the previously failing subset.
#[derive(Debug, Default)]
pub struct LastFailedSelector {
    rerun: bool,
    lastfailed: BTreeSet<String>,
}

impl LastFailedSelector {
    /// Load the previous failing set when rerun-mode is requested.
    ///
    /// A missing or corrupt entry loads as the empty set; with rerun off the
    /// selector stays inert.
    pub fn load(store: &CacheStore, rerun: bool) -> CacheResult<Self> {
        let lastfailed = if rerun {
            store.get(LASTFAILED_KEY, BTreeSet::new())?
        } else {
            BTreeSet::new()
        };
        Ok(Self { rerun, lastfailed })
    }

    pub fn is_rerun(&self) -> bool {
        self.rerun
    }

    /// Ids recorded as failing by the previous run.
    pub fn lastfailed(&self) -> &BTreeSet<String> {
        &self.lastfailed
    }

    /// Partition the collected items into (kept, deselected), preserving
    /// the original relative order of both halves.
    ///
    /// With rerun off or no recorded failures everything is kept and
    /// nothing is deselected.
    pub fn filter_collection<T>(
        &self,
        items: Vec<T>,
        id_of: impl Fn(&T) -> &str,
    ) -> (Vec<T>, Vec<T>) {
        if !self.rerun || self.lastfailed.is_empty() {
            return (items, Vec::new());
        }
        items
            .into_iter()
            .partition(|item| self.lastfailed.contains(id_of(item)))
    }

    /// One-line status for the host's run-summary header, or `None` when
    /// rerun-mode is off.
    pub fn report_header(&self) -> Option<String> {
        if !self.rerun {
            return None;
        }
        if self.lastfailed.is_empty() {
            Some("run-last-failure: run all (no recorded failures)".to_string())
        } else {
            Some(format!(
                "run-last-failure: rerun last {} failures",
                self.lastfailed.len()
            ))
        }
    }

    /// Persist this run's failures at session end.
    ///
    /// Runs every session regardless of rerun-mode; duplicates collapse and
    /// an empty set is a valid write meaning "all passed".
    pub fn session_finish<I, S>(&self, store: &CacheStore, outcomes: I) -> CacheResult<()>
    where
        I: IntoIterator<Item = (S, Outcome)>,
        S: Into<String>,
    {
        let failed: BTreeSet<String> = outcomes
            .into_iter()
            .filter(|(_, outcome)| *outcome == Outcome::Failed)
            .map(|(id, _)| id.into())
            .collect();
        trace!(count = failed.len(), "persisting last-failed set");
        store.set(LASTFAILED_KEY, &failed)?;
        Ok(())
    }
}
