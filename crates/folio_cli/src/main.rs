//! Folio CLI - Command-line interface for the repository relevance engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Rank a portfolio of repositories against a question", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new folio workspace
    Init,
    /// Import a repository record into the workspace
    Add {
        /// Path to a repository record (JSON)
        record: PathBuf,
    },
    /// Load an owner's repositories, refreshing stale cache entries
    Load {
        /// Repository owner
        owner: String,
    },
    /// Rank an owner's repositories against a query
    Rank {
        /// Repository owner
        owner: String,
        /// The query or question
        query: String,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Assemble the context handed to a language model
    Context {
        /// Repository owner
        owner: String,
        /// The query or question
        query: String,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Override the character budget
        #[arg(long)]
        max_chars: Option<usize>,
    },
    /// Print content and training fingerprints of a record
    Fingerprint {
        /// Path to a repository record (JSON)
        record: PathBuf,
    },
    /// Cache inspection and maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics
    Stats,
    /// Delete a single entry (e.g. repo:<owner>:<name>)
    Delete {
        /// Cache key
        key: String,
    },
    /// Remove entries for repositories that no longer exist
    Cleanup {
        /// Repository owner
        owner: String,
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Keys inspected per batch
        #[arg(long, default_value = "500")]
        batch_size: usize,
        /// Also remove entries with outdated fingerprints
        #[arg(long)]
        prune_stale: bool,
        /// Resume after this key
        #[arg(long)]
        start_after: Option<String>,
        /// Keep going until every key has been inspected
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Add { record } => commands::add::run(&record).await,
        Commands::Load { owner } => commands::load::run(&owner).await,
        Commands::Rank {
            owner,
            query,
            format,
        } => commands::rank::run(&owner, &query, &format).await,
        Commands::Context {
            owner,
            query,
            format,
            max_chars,
        } => commands::context::run(&owner, &query, &format, max_chars).await,
        Commands::Fingerprint { record } => commands::fingerprint::run(&record),
        Commands::Cache { command } => match command {
            CacheCommands::Stats => commands::cache::stats(),
            CacheCommands::Delete { key } => commands::cache::delete(&key),
            CacheCommands::Cleanup {
                owner,
                dry_run,
                batch_size,
                prune_stale,
                start_after,
                all,
            } => {
                let options = commands::cache::CleanupOptions {
                    dry_run,
                    batch_size,
                    prune_stale,
                    start_after,
                    all,
                };
                commands::cache::cleanup(&owner, options).await
            }
        },
    }
}
