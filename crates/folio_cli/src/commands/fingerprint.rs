//! Fingerprint command - show the digests a record is cached under.

use super::read_record;
use anyhow::{Context, Result};
use folio_core::CacheKey;
use std::path::Path;

/// Print the listing, content and training fingerprints of a record file.
pub fn run(path: &Path) -> Result<()> {
    let record = read_record(path)?;

    let listing = record
        .summary()
        .fingerprint()
        .context("Failed to fingerprint listing")?;
    let content = record
        .content_fingerprint()
        .context("Failed to fingerprint content")?;
    let training = record
        .training_fingerprint()
        .context("Failed to fingerprint training text")?;

    println!("Repository: {}", record.full_name());
    println!(
        "Listing:    {}  ({})",
        listing.as_hex(),
        CacheKey::repository(&record.owner, &record.name)
    );
    println!("Content:    {}", content.as_hex());
    println!(
        "Training:   {}  ({})",
        training.as_hex(),
        CacheKey::training(&record.owner, &record.name)
    );

    Ok(())
}
