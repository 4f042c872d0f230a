//! Cache inspection and maintenance commands.

use super::open_workspace;
use anyhow::{Context, Result};
use console::style;
use folio_core::{CacheKey, CleanupConfig, CleanupReport};
use indicatif::{ProgressBar, ProgressStyle};

/// Show cache statistics.
pub fn stats() -> Result<()> {
    let workspace = open_workspace()?;
    let store = workspace.open_cache()?;
    if !store.is_enabled() {
        println!("{} Cache is disabled in config.toml", style("ℹ").blue());
        return Ok(());
    }
    let stats = store.stats().context("Failed to read cache statistics")?;

    println!("{}", style("Cache Statistics:").bold());
    println!("  Path:          {}", workspace.cache_path().display());
    println!("  Entries:       {}", style(stats.entries).cyan());
    println!(
        "  Payload bytes: {} ({:.2} MB)",
        style(stats.payload_bytes).cyan(),
        stats.payload_bytes as f64 / 1_048_576.0
    );
    for (domain, count) in &stats.by_domain {
        println!("    {:<12} {}", domain, count);
    }
    if stats.corrupt > 0 {
        println!(
            "  {} {} corrupt entries (run 'folio cache cleanup <owner>')",
            style("⚠").yellow(),
            stats.corrupt
        );
    }

    Ok(())
}

/// Delete a single cache entry.
pub fn delete(raw_key: &str) -> Result<()> {
    let key: CacheKey = raw_key.parse()?;
    let store = open_workspace()?.open_cache()?;
    if store.delete(&key)? {
        println!("{} Deleted {}", style("✓").green(), key);
    } else {
        println!("{} No entry for {}", style("ℹ").blue(), key);
    }
    Ok(())
}

/// Options for [`cleanup`].
pub struct CleanupOptions {
    pub dry_run: bool,
    pub batch_size: usize,
    pub prune_stale: bool,
    pub start_after: Option<String>,
    pub all: bool,
}

/// Remove cache entries for repositories that no longer exist.
pub async fn cleanup(owner: &str, options: CleanupOptions) -> Result<()> {
    let engine = open_workspace()?.engine()?;

    if options.dry_run {
        println!(
            "{} Running cleanup in dry-run mode (no entries will be deleted)...",
            style("→").cyan()
        );
    } else {
        println!("{} Cleaning cache entries of {}...", style("→").cyan(), owner);
    }

    let mut config = CleanupConfig {
        dry_run: options.dry_run,
        batch_size: options.batch_size.max(1),
        start_after: options.start_after,
        prune_stale: options.prune_stale,
    };

    let pb = ProgressBar::new(config.batch_size as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:40} [{bar:40.cyan/blue}] {pos}/{len}")
            .context("Invalid progress template")?
            .progress_chars("█▓▒░  "),
    );

    let mut total = CleanupReport::default();
    let mut batches = 0usize;
    loop {
        let pb_clone = pb.clone();
        let report = engine
            .cleanup(
                owner,
                &config,
                Some(&move |current: usize, len: usize, key: &str| {
                    pb_clone.set_length(len as u64);
                    pb_clone.set_position(current as u64);
                    pb_clone.set_message(key.to_string());
                }),
            )
            .await?;
        batches += 1;

        total.inspected += report.inspected;
        total.deleted += report.deleted;
        total.would_delete += report.would_delete;
        total.stale += report.stale;
        total.errors.extend(report.errors);
        total.next_cursor = report.next_cursor.clone();

        match report.next_cursor {
            Some(cursor) if options.all => config.start_after = Some(cursor),
            _ => break,
        }
    }
    pb.finish_and_clear();

    println!();
    println!("{}", style("Cache Cleanup Report:").bold());
    println!("  Batches:        {}", batches);
    println!("  Inspected:      {}", style(total.inspected).cyan());
    println!(
        "  Deleted:        {}",
        if total.deleted > 0 {
            style(total.deleted).yellow()
        } else {
            style(total.deleted).green()
        }
    );
    if options.dry_run {
        println!("  Would delete:   {}", style(total.would_delete).yellow());
    }
    println!("  Stale:          {}", total.stale);

    if !total.errors.is_empty() {
        println!();
        println!("{}", style("Errors encountered:").red().bold());
        for error in &total.errors {
            println!("  {} {}", style("×").red(), error);
        }
    }

    if let Some(cursor) = &total.next_cursor {
        println!();
        println!("More entries remain. Continue with:");
        println!(
            "  {}",
            style(format!("folio cache cleanup {} --start-after {}", owner, cursor)).cyan()
        );
    } else if options.dry_run && total.would_delete > 0 {
        println!();
        println!("This was a dry run. To actually delete entries, run:");
        println!("  {}", style(format!("folio cache cleanup {}", owner)).cyan());
    }

    Ok(())
}
