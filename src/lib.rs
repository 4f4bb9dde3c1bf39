//! Tool Discovery - finds new AI tools on directory sites and filters out noise
//!
//! This service scrapes AI-tool directories, extracts candidate tools from
//! the pages they link to, scores each candidate with a battery of heuristic
//! checks, and drops candidates that already exist in the local directory.
//!
//! The pieces can be used on their own:
//! - [`similarity`] - normalized Levenshtein similarity between two strings
//! - [`DuplicateDetector`] - id, fuzzy name and domain matching against a corpus
//! - [`Verifier`] - seven heuristic checks producing a scored verdict

pub mod config;
pub mod corpus;
pub mod crawler;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod report;
pub mod rules;
pub mod similarity;
pub mod tool;
pub mod verifier;
pub mod workflow;

pub use config::{DiscoveryConfig, OutputConfig};
pub use crawler::{Crawler, CrawlerConfig, PageFetcher, ScrapedPage};
pub use dedup::{extract_domain, DuplicateConfig, DuplicateDetector};
pub use error::{DiscoveryError, Result};
pub use extractor::{Extractor, ToolLink};
pub use report::{DiscoveryReport, DiscoveryStats};
pub use rules::{CompiledRules, VerificationRules};
pub use similarity::{levenshtein, similarity};
pub use tool::{slugify, Candidate, Check, CorpusEntry, VerificationResult, VerifiedTool};
pub use verifier::{VerificationConfig, Verifier};
pub use workflow::{CandidateOutcome, DiscoveryOutcome, DiscoveryWorkflow};

use std::path::PathBuf;
use tracing::info;

/// Summary of a completed [`discover`] run
#[derive(Debug, Clone)]
pub struct DiscoveryRun {
    pub outcome: DiscoveryOutcome,
    /// Review queue written by the run, if any tools were found
    pub discovered_path: Option<PathBuf>,
    pub report_path: PathBuf,
}

/// Run a full discovery pass
///
/// This is the main entry point. It:
/// 1. Loads the existing directory corpus
/// 2. Crawls every configured source through the scrape service
/// 3. Verifies and de-duplicates each candidate
/// 4. Writes new tools to the review queue and a report to the report dir
///
/// # Example
/// ```ignore
/// use tool_discovery::{discover, DiscoveryConfig};
///
/// #[tokio::main]
/// async fn main() -> tool_discovery::Result<()> {
///     let config = DiscoveryConfig::load(None)?;
///     let run = discover(&config).await?;
///     println!("{} new tools", run.outcome.tools.len());
///     Ok(())
/// }
/// ```
pub async fn discover(config: &DiscoveryConfig) -> Result<DiscoveryRun> {
    let crawler = Crawler::with_config(config.crawl.clone())?;
    discover_with(crawler, config).await
}

/// Run a discovery pass with any page fetcher
pub async fn discover_with<F: PageFetcher>(fetcher: F, config: &DiscoveryConfig) -> Result<DiscoveryRun> {
    // Step 1: Load the directory snapshot
    info!("Step 1: Loading existing tools...");
    let existing = corpus::load_corpus(&config.output.corpus_path)?;

    // Step 2: Crawl, verify and de-duplicate
    info!("Step 2: Discovering tools...");
    let workflow = DiscoveryWorkflow::new(fetcher, existing, config)?;
    let outcome = workflow.run().await;

    // Step 3: Persist results
    info!("Step 3: Writing results...");
    let discovered_path = if outcome.tools.is_empty() {
        info!("No new tools discovered");
        None
    } else {
        corpus::save_discovered(&config.output.discovered_path, &outcome.tools)?;
        Some(config.output.discovered_path.clone())
    };

    let report = DiscoveryReport::new(&outcome.stats, &outcome.tools);
    let report_path = report::write_report(&config.output.report_dir, &report)?;

    info!(
        "✓ Discovery finished: {} new tools (verification rate {}%)",
        outcome.tools.len(),
        outcome.stats.verification_rate()
    );

    Ok(DiscoveryRun {
        outcome,
        discovered_path,
        report_path,
    })
}
