//! Import a repository record into the workspace.

use super::{open_workspace, read_record};
use anyhow::{Context, Result};
use console::style;
use folio_core::DirectorySource;
use std::path::Path;

/// Copy a record file into `<source>/<owner>/<name>.json`.
pub async fn run(path: &Path) -> Result<()> {
    let workspace = open_workspace()?;
    let record = read_record(path)?;
    if record.owner.is_empty() || record.name.is_empty() {
        anyhow::bail!("Record must have a non-empty owner and name");
    }

    let source = DirectorySource::new(workspace.source_dir());
    source
        .write_record(&record)
        .await
        .context("Failed to write repository record")?;

    println!(
        "{} Added {} ({} languages, {} files)",
        style("✓").green(),
        style(record.full_name()).cyan(),
        record.languages.len(),
        record.file_tree.len()
    );
    Ok(())
}
