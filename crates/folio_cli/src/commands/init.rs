//! Initialize a new folio workspace.

use anyhow::{Context, Result};
use folio_core::Workspace;

/// Initialize a new folio workspace in the current directory.
pub fn run() -> Result<()> {
    let workspace = Workspace::init(".").context("Failed to initialize folio workspace")?;

    println!("Initialized folio workspace in .folio/");
    println!();
    println!("Directory structure:");
    println!("  .folio/cache/          - Fingerprint-validated cache (rebuildable)");
    println!(
        "  .folio/{}/          - Repository records, one <owner>/<name>.json each",
        workspace.config().source.path.display()
    );
    println!();
    println!("Configuration written to .folio/config.toml");

    Ok(())
}
