//! Load an owner's repositories through the cache.

use super::open_workspace;
use anyhow::Result;
use console::style;

/// Load repositories and report cache behavior.
pub async fn run(owner: &str) -> Result<()> {
    let engine = open_workspace()?.engine()?;
    let loaded = engine
        .load_repositories(owner)
        .await
        .map_err(|failure| anyhow::anyhow!("Failed to list repositories of {}: {}", owner, failure))?;

    println!("{}", style(format!("Repositories of {}:", owner)).bold());
    println!("  Loaded:      {}", style(loaded.records.len()).cyan());
    println!("  Cache hits:  {}", style(loaded.cache_hits).green());
    println!("  Fetched:     {}", style(loaded.fetched).yellow());
    if loaded.bundle_hit {
        println!("  {} Served from owner bundle", style("✓").green());
    }
    if !loaded.training_changed.is_empty() {
        println!(
            "  Text changed: {}",
            loaded.training_changed.join(", ")
        );
    }

    if !loaded.failures.is_empty() {
        println!();
        println!("{}", style("Failed repositories:").red().bold());
        for (name, failure) in &loaded.failures {
            println!("  {} {}: {}", style("×").red(), name, failure);
        }
    }

    Ok(())
}
