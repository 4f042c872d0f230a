//! Explicit batch cleanup of cache entries whose source went away.
//!
//! There is no background eviction. A cleanup run scans a bounded batch of
//! keys, asks a [`LiveFingerprints`] oracle about each one and removes the
//! entries whose live input can no longer be computed.

use crate::cache::{CacheKey, CacheStore};
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Progress callback for cleanup runs.
/// Called with (current, total, key).
pub type CleanupProgressCallback<'a> = dyn Fn(usize, usize, &str) + 'a;

/// Default number of keys inspected per run.
pub const DEFAULT_CLEANUP_BATCH_SIZE: usize = 500;

/// Configuration for a cleanup run.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Report what would be deleted without deleting anything.
    pub dry_run: bool,

    /// Maximum number of keys inspected in this run.
    pub batch_size: usize,

    /// Resume after this rendered key (the previous run's `next_cursor`).
    pub start_after: Option<String>,

    /// Also remove entries whose stored fingerprint no longer matches.
    /// They would be refreshed on next use anyway.
    pub prune_stale: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: DEFAULT_CLEANUP_BATCH_SIZE,
            start_after: None,
            prune_stale: false,
        }
    }
}

/// What the live sources say about one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    /// Source exists and this is its current fingerprint.
    Present(Fingerprint),
    /// Source exists but its fingerprint is not cheap to compute.
    Listed,
    /// Source disappeared.
    Gone,
    /// Outside the oracle's scope; leave the entry alone.
    Unknown,
}

/// Oracle answering whether a cache entry's live input still exists.
pub trait LiveFingerprints {
    /// Live state for `key`.
    fn live_state(&self, key: &CacheKey) -> LiveState;
}

/// Point-in-time view of one owner's live inputs.
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot {
    owner: String,
    entries: HashMap<CacheKey, Option<Fingerprint>>,
}

impl LiveSnapshot {
    /// Empty snapshot scoped to `owner`: every key of that owner is `Gone`
    /// until inserted.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: HashMap::new(),
        }
    }

    /// Records a live key with a known fingerprint.
    pub fn insert(&mut self, key: CacheKey, fingerprint: Fingerprint) {
        self.entries.insert(key, Some(fingerprint));
    }

    /// Records a live key whose fingerprint is unknown.
    pub fn insert_listed(&mut self, key: CacheKey) {
        self.entries.insert(key, None);
    }

    /// Owner this snapshot speaks for.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl LiveFingerprints for LiveSnapshot {
    fn live_state(&self, key: &CacheKey) -> LiveState {
        if key.owner != self.owner {
            return LiveState::Unknown;
        }
        match self.entries.get(key) {
            Some(Some(fp)) => LiveState::Present(*fp),
            Some(None) => LiveState::Listed,
            None => LiveState::Gone,
        }
    }
}

/// Report from a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Keys looked at.
    pub inspected: usize,

    /// Entries actually removed.
    pub deleted: usize,

    /// Entries that a non-dry run would remove.
    pub would_delete: usize,

    /// Entries whose stored fingerprint differs from the live one.
    pub stale: usize,

    /// Errors encountered during cleanup (non-fatal).
    pub errors: Vec<String>,

    /// Cursor for the next batch, when this one was full.
    pub next_cursor: Option<String>,
}

/// Runs one cleanup batch.
///
/// Entries whose source is gone are removed; with `prune_stale`, entries with
/// a mismatched fingerprint are removed too. A dry run never mutates the
/// store. Per-key failures are collected in the report and never abort the
/// batch.
///
/// # Errors
///
/// Returns an error only if the key scan itself fails.
pub fn cleanup(
    store: &CacheStore,
    live: &dyn LiveFingerprints,
    config: &CleanupConfig,
    progress: Option<&CleanupProgressCallback<'_>>,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    let keys = store.keys_after(config.start_after.as_deref(), config.batch_size)?;
    let total = keys.len();

    for (i, raw) in keys.iter().enumerate() {
        if let Some(cb) = progress {
            cb(i, total, raw);
        }
        report.inspected += 1;

        let key: CacheKey = match raw.parse() {
            Ok(key) => key,
            Err(e) => {
                report.errors.push(format!("{}: {}", raw, e));
                continue;
            }
        };

        let remove = match live.live_state(&key) {
            LiveState::Gone => {
                debug!(%key, "source gone");
                true
            }
            LiveState::Present(current) => match store.stored_fingerprint(&key) {
                Ok(Some(stored)) if stored != current => {
                    report.stale += 1;
                    config.prune_stale
                }
                Ok(_) => false,
                Err(e) => {
                    report.errors.push(format!("{}: {}", key, e));
                    true
                }
            },
            LiveState::Listed | LiveState::Unknown => false,
        };

        if !remove {
            continue;
        }
        if config.dry_run {
            report.would_delete += 1;
            continue;
        }
        match store.delete(&key) {
            Ok(true) => report.deleted += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(%key, error = %e, "failed to delete cache entry");
                report.errors.push(format!("{}: {}", key, e));
            }
        }
    }

    if let Some(cb) = progress {
        cb(total, total, "");
    }

    if total == config.batch_size && total > 0 {
        report.next_cursor = keys.last().cloned();
    }

    info!(
        inspected = report.inspected,
        deleted = report.deleted,
        would_delete = report.would_delete,
        errors = report.errors.len(),
        dry_run = config.dry_run,
        "cache cleanup finished"
    );
    Ok(report)
}
