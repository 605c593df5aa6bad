use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use slack_archive_search::ArchiveSearchService;
use slack_archive_search::search::config::DEFAULT_SEARCH_LIMIT;
use slack_archive_search::search::outputs::{SearchErrorOutput, SearchOutput};
use slack_archive_search::terminal::{Terminal, render_message};

/// Import a Slack export and search it from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom data directory path (defaults to ~/.slack-archive-search)
    #[arg(long, env = "SLACK_ARCHIVE_SEARCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import an unpacked Slack export, replacing the last import
    Import {
        /// Directory containing users.json, channels.json and one folder per channel
        archive: PathBuf,
    },
    /// Search the last import
    Search {
        /// Query, e.g. `+channel:lunch +user:jesse.plamondon pineapple`
        query: String,
        /// Maximum number of matches to print
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize the last import
    Stats,
    /// Rebuild the search index from the last import
    Reindex,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The interactive prompt shares the terminal, so keep it quiet unless asked
    let default_level = if args.command.is_some() {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Some(ref data_dir) = args.data_dir {
        tracing::info!("Using custom data directory: {}", data_dir.display());
    }
    let service = ArchiveSearchService::new(args.data_dir)?;

    match args.command {
        None => {
            let stdin = io::stdin();
            let mut terminal = Terminal::new(stdin.lock(), io::stdout());
            terminal.run(&service)?;
            Ok(())
        }
        Some(command) => handle_command(&service, command),
    }
}

fn handle_command(service: &ArchiveSearchService, command: Commands) -> Result<()> {
    match command {
        Commands::Import { archive } => {
            let dataset = service
                .import_archive(&archive)
                .with_context(|| format!("Failed to import {}", archive.display()))?;
            let summary = ArchiveSearchService::summary(&dataset);
            println!(
                "Imported {} messages by {} users in {} channels.",
                summary.message_count, summary.user_count, summary.channel_count
            );
            Ok(())
        }
        Commands::Search { query, limit, json } => search(service, &query, limit, json),
        Commands::Stats => {
            let dataset = load_or_exit(service)?;
            println!("{}", serde_json::to_string_pretty(&ArchiveSearchService::summary(&dataset))?);
            Ok(())
        }
        Commands::Reindex => {
            let dataset = load_or_exit(service)?;
            service.reindex(&dataset)?;
            println!("Rebuilt the search index for {} messages.", dataset.messages().len());
            Ok(())
        }
    }
}

fn search(service: &ArchiveSearchService, query: &str, limit: usize, json: bool) -> Result<()> {
    let dataset = load_or_exit(service)?;

    let results = match service
        .search(query, &dataset)
        .and_then(|hits| hits.collect_results())
    {
        Ok(results) => results,
        Err(e) if e.is_recoverable() && json => {
            println!("{}", SearchErrorOutput::new(e.to_string()).to_json());
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", SearchOutput::new(query, &results, limit).to_json());
        return Ok(());
    }

    for message in results.messages.iter().take(limit) {
        println!("{}", render_message(message));
    }
    println!(
        "Showing {} of {} matches.",
        results.messages.len().min(limit),
        results.total_matches
    );
    if !results.orphaned.is_empty() {
        eprintln!(
            "Warning: {} matches were skipped because the search index is out of sync. Run `slack-archive-search reindex` to rebuild it.",
            results.orphaned.len()
        );
    }
    Ok(())
}

fn load_or_exit(service: &ArchiveSearchService) -> Result<slack_archive_search::Dataset> {
    match service.load_cache()? {
        Some(dataset) => Ok(dataset),
        None => {
            eprintln!("Error: there's no cached import available. Run `slack-archive-search import <ARCHIVE>` first.");
            process::exit(1);
        }
    }
}
