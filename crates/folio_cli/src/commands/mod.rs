//! CLI commands.

pub mod add;
pub mod cache;
pub mod context;
pub mod fingerprint;
pub mod init;
pub mod load;
pub mod rank;

use anyhow::{Context, Result};
use folio_core::{RepositoryRecord, Workspace};
use std::path::Path;

/// Open the workspace in the current directory, with a hint on failure.
pub fn open_workspace() -> Result<Workspace> {
    Workspace::open(".").map_err(|e| match e.recovery_suggestion() {
        Some(hint) => anyhow::anyhow!("{}\n  hint: {}", e, hint),
        None => anyhow::Error::new(e),
    })
}

/// Read a repository record from a JSON file.
pub fn read_record(path: &Path) -> Result<RepositoryRecord> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid repository record", path.display()))
}
