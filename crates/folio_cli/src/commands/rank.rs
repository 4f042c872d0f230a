//! Rank command - score repositories against a query.

use super::open_workspace;
use anyhow::{Context, Result};
use chrono::DateTime;
use console::style;
use folio_core::QueryOutcome;

/// Rank an owner's repositories and print the scores.
pub async fn run(owner: &str, query: &str, format: &str) -> Result<()> {
    let engine = open_workspace()?.engine()?;
    let outcome = engine.query(owner, query).await;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&outcome.ranking)
                .context("Failed to serialize ranking to JSON")?;
            println!("{}", json);
        }
        "text" => print_text(&outcome),
        _ => {
            anyhow::bail!("Unsupported format: {}. Use 'json' or 'text'.", format);
        }
    }

    Ok(())
}

fn print_text(outcome: &QueryOutcome) {
    if let Some(failure) = &outcome.listing_failure {
        println!("{} Listing failed: {}", style("×").red(), failure);
    }
    if outcome.no_relevant_projects {
        println!("{}", folio_core::NO_RELEVANT_PROJECTS);
        return;
    }

    let ranking = &outcome.ranking;
    if ranking.fallback_used {
        println!(
            "{} No repository cleared the relevance threshold; showing closest matches.",
            style("ℹ").blue()
        );
        println!();
    }

    println!(
        "{:>4}  {:<32} {:>6} {:>6} {:>6} {:>6}  {}",
        "rank", "repository", "total", "sem", "lang", "comp", "updated"
    );
    for (i, record) in ranking.records.iter().enumerate() {
        let shortlisted = ranking
            .shortlist
            .iter()
            .find(|entry| entry.repository == record.repository);
        let updated = DateTime::from_timestamp(record.updated_at, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d");
        let line = format!(
            "{:>4}  {:<32} {:>6.3} {:>6.2} {:>6.2} {:>6.2}  {}",
            i + 1,
            record.repository,
            record.total_score,
            record.semantic_score,
            record.language_score,
            record.composition_score,
            updated
        );
        match shortlisted {
            Some(entry) => println!("{} {}", style(line).green(), style(entry.tier).dim()),
            None => println!("{}", line),
        }
    }

    if !outcome.failures.is_empty() {
        println!();
        println!("{}", style("Skipped (fetch failed):").yellow().bold());
        for (name, failure) in &outcome.failures {
            println!("  {} {}: {}", style("×").red(), name, failure);
        }
    }
}
