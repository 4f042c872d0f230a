//! Fetch boundary: the repository source collaborator and the parallel fan-out.
//!
//! Every source response is turned into a [`FetchResult`] exactly once, here.
//! Failures stay local to the repository that produced them.

use crate::config::FetchConfig;
use crate::types::{RepositoryRecord, RepositorySummary};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Why a single repository could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailureKind {
    /// Transport failure.
    Network,
    /// Credentials rejected or missing.
    Auth,
    /// The repository does not exist (any more).
    NotFound,
    /// Still pending when the fan-out deadline passed.
    Timeout,
    /// The response could not be interpreted.
    Malformed,
}

impl fmt::Display for FetchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchFailureKind::Network => "network",
            FetchFailureKind::Auth => "auth",
            FetchFailureKind::NotFound => "not found",
            FetchFailureKind::Timeout => "timeout",
            FetchFailureKind::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

/// A failed fetch of one repository or listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {reason}")]
pub struct FetchFailure {
    /// Failure class.
    pub kind: FetchFailureKind,
    /// Human-readable detail.
    pub reason: String,
}

impl FetchFailure {
    /// Creates a failure.
    pub fn new(kind: FetchFailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`FetchFailureKind::NotFound`].
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(FetchFailureKind::NotFound, reason)
    }

    /// Shorthand for [`FetchFailureKind::Malformed`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(FetchFailureKind::Malformed, reason)
    }
}

/// Result of one call across the fetch boundary.
pub type FetchResult<T> = std::result::Result<T, FetchFailure>;

/// Supplier of repository data. Calls must be idempotent and must not touch
/// the caller's state.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Cheap listing of an owner's repositories, used for fingerprinting.
    async fn list_repositories(&self, owner: &str) -> FetchResult<Vec<RepositorySummary>>;

    /// Full record of one repository.
    async fn fetch_repository_bundle(&self, owner: &str, name: &str)
        -> FetchResult<RepositoryRecord>;
}

/// Joined outcome of a fan-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchBatch {
    /// Successfully fetched records, sorted by name.
    pub records: Vec<RepositoryRecord>,
    /// Failures by repository name.
    pub failures: BTreeMap<String, FetchFailure>,
}

/// Fetches `names` concurrently and joins the results.
///
/// At most `max_concurrency` fetches are in flight. A single deadline of
/// `timeout_ms` covers the whole fan-out: whatever is still pending when it
/// passes becomes a [`FetchFailureKind::Timeout`] for that repository only.
pub async fn fetch_all<S>(
    source: &S,
    owner: &str,
    names: &[String],
    config: &FetchConfig,
) -> FetchBatch
where
    S: RepositorySource + ?Sized,
{
    let deadline = Instant::now() + config.timeout();
    debug!(owner, count = names.len(), "fetching repositories");

    let results: Vec<(String, FetchResult<RepositoryRecord>)> = stream::iter(names.iter())
        .map(|name| async move {
            let outcome = match timeout_at(deadline, source.fetch_repository_bundle(owner, name))
                .await
            {
                Ok(Ok(record)) if record.owner != owner || record.name != *name => {
                    Err(FetchFailure::malformed(format!(
                        "asked for {}/{}, got {}",
                        owner,
                        name,
                        record.full_name()
                    )))
                }
                Ok(result) => result,
                Err(_) => Err(FetchFailure::new(
                    FetchFailureKind::Timeout,
                    format!("no response within {} ms", config.timeout_ms),
                )),
            };
            (name.clone(), outcome)
        })
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;

    let mut batch = FetchBatch::default();
    for (name, outcome) in results {
        match outcome {
            Ok(record) => batch.records.push(record),
            Err(failure) => {
                warn!(owner, repository = %name, %failure, "repository fetch failed");
                batch.failures.insert(name, failure);
            }
        }
    }
    batch.records.sort_by(|a, b| a.name.cmp(&b.name));
    batch
}
