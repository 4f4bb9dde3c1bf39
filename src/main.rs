//! Tool Discovery CLI
//!
//! A command-line tool for discovering new AI tools and checking individual
//! candidates against the verification and duplicate rules.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tool_discovery::corpus::load_corpus;
use tool_discovery::{
    discover, similarity, Candidate, DiscoveryConfig, DuplicateDetector, Verifier,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "tool-discovery")]
#[command(about = "Discover, verify and de-duplicate AI tools from directory sites")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./tool-discovery.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl all configured sources and queue new tools for review
    Discover {
        /// Existing tools file (overrides config)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Where to write newly discovered tools (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print discovered tools as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the verification checks on a single candidate
    Verify {
        /// Tool name
        #[arg(short, long)]
        name: String,

        /// Tool description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Tool website
        #[arg(short, long)]
        website: Option<String>,

        /// Feature bullet (repeatable)
        #[arg(short, long = "feature")]
        features: Vec<String>,

        /// File with the raw page content the candidate was scraped from
        #[arg(long)]
        content: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a tool already exists in the corpus
    CheckDuplicate {
        /// Tool name
        #[arg(short, long)]
        name: String,

        /// Tool website
        #[arg(short, long)]
        website: Option<String>,

        /// Explicit tool id (derived from the name if omitted)
        #[arg(long)]
        id: Option<String>,

        /// Existing tools file (overrides config)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the normalized similarity of two strings
    Similarity {
        a: String,
        b: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(cli.command, cli.config.as_deref()).await
}

fn load_config(path: Option<&Path>) -> Result<DiscoveryConfig> {
    DiscoveryConfig::load(path).context("Failed to load configuration")
}

async fn run(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Discover {
            corpus,
            output,
            json,
        } => {
            let mut config = load_config(config_path)?;
            if let Some(path) = corpus {
                config.output.corpus_path = path;
            }
            if let Some(path) = output {
                config.output.discovered_path = path;
            }

            info!("Starting discovery across {} sources", config.crawl.sources.len());
            let discovery = discover(&config).await?;
            let stats = &discovery.outcome.stats;

            if json {
                println!("{}", serde_json::to_string_pretty(&discovery.outcome.tools)?);
            } else {
                println!("\nDiscovery complete!");
                println!("  Sources processed: {}", stats.sources);
                println!("  Pages crawled:     {}", stats.crawled);
                println!("  Verified:          {}", stats.verified);
                println!("  Rejected:          {}", stats.rejected);
                println!("  Duplicates:        {}", stats.duplicates);
                println!("  Errors:            {}", stats.errors);
                println!("  New tools:         {}", stats.added);

                for tool in &discovery.outcome.tools {
                    println!(
                        "    - {} ({}) score {}",
                        tool.candidate.name,
                        tool.candidate.website.as_deref().unwrap_or("no website"),
                        tool.verification.score
                    );
                }
                if let Some(path) = &discovery.discovered_path {
                    println!("  Review queue: {}", path.display());
                }
                println!("  Report: {}", discovery.report_path.display());
            }
        }

        Commands::Verify {
            name,
            description,
            website,
            features,
            content,
            json,
        } => {
            let raw_content = match content {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => String::new(),
            };

            let mut candidate = Candidate::new(name, description).with_features(features);
            if let Some(website) = website {
                candidate = candidate.with_website(website);
            }

            let config = load_config(config_path)?;
            let verifier = Verifier::with_config(&config.verification)?;
            let result = verifier.verify(&candidate, &raw_content).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&*result)?);
            } else {
                println!("=== Verification: {} ===\n", candidate.name);
                for (check, passed) in &result.checks {
                    println!("  [{}] {}", if *passed { "PASS" } else { "FAIL" }, check);
                }
                println!();
                println!("Score:    {}", result.score);
                println!("Verified: {}", result.is_verified);
                println!("Reason:   {}", result.reason);
            }
        }

        Commands::CheckDuplicate {
            name,
            website,
            id,
            corpus,
            json,
        } => {
            let config = load_config(config_path)?;
            let corpus_path = corpus.unwrap_or(config.output.corpus_path);
            let detector =
                DuplicateDetector::with_config(load_corpus(&corpus_path)?, config.duplicate);

            let mut candidate = Candidate::new(name, "");
            if let Some(website) = website {
                candidate = candidate.with_website(website);
            }
            if let Some(id) = id {
                candidate = candidate.with_id(id);
            }

            let duplicate = detector.is_duplicate(&candidate);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": candidate.identifier(),
                        "duplicate": duplicate,
                        "corpusSize": detector.len(),
                    })
                );
            } else if duplicate {
                println!("'{}' already exists in the directory", candidate.name);
            } else {
                println!(
                    "'{}' is new ({} tools checked)",
                    candidate.name,
                    detector.len()
                );
            }
        }

        Commands::Similarity { a, b } => {
            println!("{:.4}", similarity(&a, &b));
        }
    }

    Ok(())
}
