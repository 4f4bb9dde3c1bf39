//! Discovery workflow
//!
//! Scrapes each discovery source, follows its tool links, extracts and
//! verifies a candidate per tool page, and drops anything already in the
//! directory. Sources and pages are processed one at a time with a pause
//! between scrape requests.

use crate::config::DiscoveryConfig;
use crate::crawler::{CrawlerConfig, PageFetcher};
use crate::dedup::DuplicateDetector;
use crate::error::Result;
use crate::extractor::{Extractor, ToolLink};
use crate::report::DiscoveryStats;
use crate::tool::{Candidate, CorpusEntry, VerifiedTool};
use crate::verifier::Verifier;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// What happened to a single candidate
#[derive(Debug, Clone)]
pub enum CandidateOutcome {
    Accepted(VerifiedTool),
    Rejected { name: String, reason: String },
    Duplicate { name: String },
}

/// Result of a full discovery run
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub tools: Vec<VerifiedTool>,
    pub stats: DiscoveryStats,
}

pub struct DiscoveryWorkflow<F: PageFetcher> {
    fetcher: F,
    verifier: Verifier,
    extractor: Extractor,
    detector: DuplicateDetector,
    crawl: CrawlerConfig,
    /// Identifiers accepted earlier in this run, so a tool listed by several
    /// sources is only queued once
    accepted: Mutex<HashSet<String>>,
}

impl<F: PageFetcher> DiscoveryWorkflow<F> {
    pub fn new(fetcher: F, corpus: Vec<CorpusEntry>, config: &DiscoveryConfig) -> Result<Self> {
        let verifier = Verifier::with_config(&config.verification)?;
        let extractor = Extractor::new(verifier.rules());
        let detector = DuplicateDetector::with_config(corpus, config.duplicate.clone());

        Ok(Self {
            fetcher,
            verifier,
            extractor,
            detector,
            crawl: config.crawl.clone(),
            accepted: Mutex::new(HashSet::new()),
        })
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    /// Run discovery over every configured source
    pub async fn run(&self) -> DiscoveryOutcome {
        info!(
            "Starting discovery over {} sources ({} known tools)",
            self.crawl.sources.len(),
            self.detector.len()
        );

        let mut outcome = DiscoveryOutcome::default();
        for source in &self.crawl.sources {
            self.process_source(source, &mut outcome).await;
        }

        info!(
            "Discovery complete: {} crawled, {} verified, {} duplicates, {} added, {} errors",
            outcome.stats.crawled,
            outcome.stats.verified,
            outcome.stats.duplicates,
            outcome.stats.added,
            outcome.stats.errors
        );
        outcome
    }

    /// Scrape one discovery source and everything it links to
    ///
    /// Failures are counted and logged; they never abort the run.
    pub async fn process_source(&self, source: &str, outcome: &mut DiscoveryOutcome) {
        info!("Processing source: {}", source);

        let listing = match self.fetcher.fetch_page(source).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to scrape source {}: {}", source, e);
                outcome.stats.errors += 1;
                return;
            }
        };
        outcome.stats.sources += 1;

        let links: Vec<ToolLink> = self
            .extractor
            .extract_tool_links(&listing.markdown, source)
            .into_iter()
            .take(self.crawl.max_requests_per_source)
            .collect();
        info!("Found {} potential tools on {}", links.len(), source);

        for link in &links {
            self.pause().await;

            let page = match self.fetcher.fetch_page(&link.url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Failed to scrape tool page {}: {}", link.url, e);
                    outcome.stats.errors += 1;
                    continue;
                }
            };
            outcome.stats.crawled += 1;

            let candidate = self.extractor.extract_candidate(&page, link, source);
            match self.process_candidate(&candidate, &page.markdown).await {
                CandidateOutcome::Accepted(tool) => {
                    outcome.stats.verified += 1;
                    outcome.stats.added += 1;
                    outcome.tools.push(tool);
                }
                CandidateOutcome::Duplicate { .. } => {
                    outcome.stats.verified += 1;
                    outcome.stats.duplicates += 1;
                }
                CandidateOutcome::Rejected { reason, .. } => {
                    outcome.stats.record_rejection(&reason);
                }
            }
        }
    }

    /// Verify a candidate, then check it against the directory
    pub async fn process_candidate(&self, candidate: &Candidate, content: &str) -> CandidateOutcome {
        let verification = self.verifier.verify(candidate, content).await;

        if !verification.is_verified {
            info!("✗ Rejected: {} - {}", candidate.name, verification.reason);
            return CandidateOutcome::Rejected {
                name: candidate.name.clone(),
                reason: verification.reason.clone(),
            };
        }

        if self.detector.is_duplicate(candidate) || !self.claim(candidate) {
            debug!("Skipping duplicate: {}", candidate.name);
            return CandidateOutcome::Duplicate {
                name: candidate.name.clone(),
            };
        }

        info!("✓ Verified: {} (score: {})", candidate.name, verification.score);
        CandidateOutcome::Accepted(VerifiedTool {
            candidate: candidate.clone(),
            verification: (*verification).clone(),
            discovered_at: Utc::now(),
        })
    }

    /// Record a candidate as accepted in this run; false if already taken
    fn claim(&self, candidate: &Candidate) -> bool {
        let mut accepted = self.accepted.lock().unwrap_or_else(|e| e.into_inner());
        accepted.insert(candidate.identifier())
    }

    async fn pause(&self) {
        let delay = self.crawl.request_delay();
        if delay > Duration::ZERO {
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::ScrapedPage;
    use crate::error::DiscoveryError;
    use async_trait::async_trait;

    struct NoPages;

    #[async_trait]
    impl PageFetcher for NoPages {
        async fn fetch_page(&self, url: &str) -> Result<ScrapedPage> {
            Err(DiscoveryError::ScrapeFailed {
                url: url.to_string(),
                message: "offline".to_string(),
            })
        }
    }

    fn config() -> DiscoveryConfig {
        let mut config = DiscoveryConfig::default();
        config.crawl.delay_between_requests_ms = 0;
        config.crawl.sources = vec!["https://directory.example/".to_string()];
        config
    }

    fn widgetly() -> Candidate {
        Candidate::new(
            "Widgetly",
            "Widgetly helps teams automate customer support workflows using AI.",
        )
        .with_website("https://widgetly.io")
    }

    #[tokio::test]
    async fn unreachable_source_counts_as_error() {
        let workflow = DiscoveryWorkflow::new(NoPages, Vec::new(), &config()).unwrap();
        let outcome = workflow.run().await;

        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(outcome.stats.sources, 0);
        assert!(outcome.tools.is_empty());
    }

    #[tokio::test]
    async fn verified_candidate_is_accepted() {
        let workflow = DiscoveryWorkflow::new(NoPages, Vec::new(), &config()).unwrap();
        let outcome = workflow.process_candidate(&widgetly(), "pricing api").await;

        match outcome {
            CandidateOutcome::Accepted(tool) => {
                assert_eq!(tool.candidate.name, "Widgetly");
                assert!(tool.verification.is_verified);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn known_tool_is_a_duplicate() {
        let corpus = vec![CorpusEntry::new("widgetly-app", "Widgetly App", Some("https://www.widgetly.io/"))];
        let workflow = DiscoveryWorkflow::new(NoPages, corpus, &config()).unwrap();

        assert!(matches!(
            workflow.process_candidate(&widgetly(), "pricing api").await,
            CandidateOutcome::Duplicate { .. }
        ));
    }

    #[tokio::test]
    async fn same_tool_accepted_once_per_run() {
        let workflow = DiscoveryWorkflow::new(NoPages, Vec::new(), &config()).unwrap();

        assert!(matches!(
            workflow.process_candidate(&widgetly(), "pricing api").await,
            CandidateOutcome::Accepted(_)
        ));
        assert!(matches!(
            workflow.process_candidate(&widgetly(), "pricing api").await,
            CandidateOutcome::Duplicate { .. }
        ));
    }

    #[tokio::test]
    async fn unverified_candidate_is_rejected_with_reason() {
        let workflow = DiscoveryWorkflow::new(NoPages, Vec::new(), &config()).unwrap();
        let outcome = workflow
            .process_candidate(&Candidate::new("Home", "Click here"), "")
            .await;

        match outcome {
            CandidateOutcome::Rejected { reason, .. } => {
                assert!(reason.starts_with("Invalid or generic tool name"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
