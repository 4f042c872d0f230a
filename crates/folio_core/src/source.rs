//! On-disk repository source: `<root>/<owner>/<name>.json` files holding
//! [`RepositoryRecord`] JSON.

use crate::fetch::{FetchFailure, FetchFailureKind, FetchResult, RepositorySource};
use crate::types::{RepositoryRecord, RepositorySummary};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads repository records from a directory tree.
///
/// Records without a `head_sha` get a digest of their file contents in the
/// listing instead, so any edit to the file invalidates cached copies.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one record file.
    pub fn record_path(&self, owner: &str, name: &str) -> PathBuf {
        self.root.join(owner).join(format!("{}.json", name))
    }

    /// Writes `record` to its file, creating the owner directory.
    pub async fn write_record(&self, record: &RepositoryRecord) -> std::io::Result<()> {
        let path = self.record_path(&record.owner, &record.name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, json).await
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

fn io_failure(path: &Path, error: std::io::Error) -> FetchFailure {
    let kind = match error.kind() {
        ErrorKind::NotFound => FetchFailureKind::NotFound,
        ErrorKind::PermissionDenied => FetchFailureKind::Auth,
        _ => FetchFailureKind::Network,
    };
    FetchFailure::new(kind, format!("{}: {}", path.display(), error))
}

fn summarize(owner: &str, name: &str, bytes: &[u8]) -> RepositorySummary {
    let content_digest = || blake3::hash(bytes).to_hex().to_string();
    match serde_json::from_slice::<RepositoryRecord>(bytes) {
        Ok(record) => {
            let mut summary = record.summary();
            summary.owner = owner.to_string();
            summary.name = name.to_string();
            if summary.head_sha.is_none() {
                summary.head_sha = Some(content_digest());
            }
            summary
        }
        Err(e) => {
            // Still listed so the fetch reports it as malformed.
            warn!(owner, repository = name, error = %e, "unreadable repository record");
            RepositorySummary {
                owner: owner.to_string(),
                name: name.to_string(),
                updated_at: 0,
                pushed_at: 0,
                size_bytes: bytes.len() as u64,
                head_sha: Some(content_digest()),
            }
        }
    }
}

#[async_trait]
impl RepositorySource for DirectorySource {
    async fn list_repositories(&self, owner: &str) -> FetchResult<Vec<RepositorySummary>> {
        if !is_safe_segment(owner) {
            return Err(FetchFailure::not_found(format!("invalid owner '{}'", owner)));
        }
        let dir = self.root.join(owner);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_failure(&dir, e))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_failure(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable record file");
                    continue;
                }
            };
            summaries.push(summarize(owner, name, &bytes));
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(owner, count = summaries.len(), "listed repositories");
        Ok(summaries)
    }

    async fn fetch_repository_bundle(
        &self,
        owner: &str,
        name: &str,
    ) -> FetchResult<RepositoryRecord> {
        if !is_safe_segment(owner) || !is_safe_segment(name) {
            return Err(FetchFailure::not_found(format!("invalid repository '{}/{}'", owner, name)));
        }
        let path = self.record_path(owner, name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_failure(&path, e))?;
        let mut record: RepositoryRecord = serde_json::from_slice(&bytes)
            .map_err(|e| FetchFailure::malformed(format!("{}: {}", path.display(), e)))?;

        // The file location is authoritative for identity.
        record.owner = owner.to_string();
        record.name = name.to_string();
        Ok(record)
    }
}
