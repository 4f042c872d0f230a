//! Context command - print the assembled model context.

use super::open_workspace;
use anyhow::{Context, Result};
use console::style;
use folio_core::{DirectorySource, RelevanceEngine};

/// Assemble context for a query and print it.
pub async fn run(owner: &str, query: &str, format: &str, max_chars: Option<usize>) -> Result<()> {
    let workspace = open_workspace()?;
    let mut config = workspace.config().clone();
    if let Some(max_chars) = max_chars {
        config.context.max_chars = max_chars;
    }
    let engine = RelevanceEngine::new(
        DirectorySource::new(workspace.source_dir()),
        workspace.open_cache()?,
        config,
    );

    let outcome = engine.query(owner, query).await;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&outcome.context)
                .context("Failed to serialize context to JSON")?;
            println!("{}", json);
        }
        "text" => {
            if outcome.no_relevant_projects {
                println!("{}", folio_core::NO_RELEVANT_PROJECTS);
                return Ok(());
            }
            println!("{}", outcome.context.text);
            eprintln!();
            eprintln!(
                "{} {} chars, ~{} tokens{}",
                style("→").cyan(),
                outcome.context.chars,
                outcome.context.estimated_tokens,
                if outcome.context.truncated {
                    " (truncated)"
                } else {
                    ""
                }
            );
        }
        _ => {
            anyhow::bail!("Unsupported format: {}. Use 'json' or 'text'.", format);
        }
    }

    Ok(())
}
