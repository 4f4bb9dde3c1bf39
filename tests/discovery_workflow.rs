//! End-to-end discovery runs against canned pages

use async_trait::async_trait;
use std::collections::HashMap;
use tool_discovery::{
    discover_with, DiscoveryConfig, DiscoveryError, DiscoveryWorkflow, PageFetcher, Result,
    ScrapedPage,
};

const SOURCE: &str = "https://directory.example/";
const DOWN_SOURCE: &str = "https://down.example/";

const LISTING: &str = "\
# Top AI tools this week

- [Widgetly](https://widgetly.io)
- [Scribeflow](https://scribeflow.app)
- [Home](https://directory.example/home)
- [Broken Tool](https://broken.dev)
- [Jasper Writer](https://jasper.ai)
- [Thin](https://thin.dev)
- ![Logo](https://cdn.example/logo.png)
";

const WIDGETLY: &str = "\
# Widgetly

Widgetly helps teams automate customer support workflows using AI.

## Features
- Automated ticket triage
- Slack and Zendesk integration

Simple pricing with a free trial.
";

const SCRIBEFLOW: &str = "\
# Scribeflow

Scribeflow is a generative writing assistant that helps marketing teams create content faster.

Plans and pricing are available, plus an API for developers.
";

const JASPER: &str = "\
# Jasper

Jasper helps marketing teams generate on-brand content with AI.

See pricing and plans.
";

const THIN: &str = "Coming soon";

/// Serves markdown from a fixed map; unknown URLs fail like a blocked scrape
struct CannedPages {
    pages: HashMap<&'static str, &'static str>,
}

impl CannedPages {
    fn new() -> Self {
        let pages = HashMap::from([
            (SOURCE, LISTING),
            ("https://widgetly.io", WIDGETLY),
            ("https://scribeflow.app", SCRIBEFLOW),
            ("https://jasper.ai", JASPER),
            ("https://thin.dev", THIN),
        ]);
        Self { pages }
    }
}

#[async_trait]
impl PageFetcher for CannedPages {
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage> {
        match self.pages.get(url) {
            Some(markdown) => Ok(ScrapedPage {
                url: url.to_string(),
                markdown: markdown.to_string(),
                html: None,
            }),
            None => Err(DiscoveryError::ScrapeFailed {
                url: url.to_string(),
                message: "blocked".to_string(),
            }),
        }
    }
}

fn config(dir: &tempfile::TempDir) -> DiscoveryConfig {
    let mut config = DiscoveryConfig::default();
    config.crawl.sources = vec![SOURCE.to_string(), DOWN_SOURCE.to_string()];
    config.crawl.delay_between_requests_ms = 0;
    config.output.corpus_path = dir.path().join("aiToolsData.json");
    config.output.discovered_path = dir.path().join("discovered-tools.json");
    config.output.report_dir = dir.path().join("reports");
    config
}

fn write_corpus(config: &DiscoveryConfig) {
    std::fs::write(
        &config.output.corpus_path,
        r#"[{"id": "jasper-ai", "name": "Jasper AI", "website": "https://www.jasper.ai/", "category": "Writing"}]"#,
    )
    .unwrap();
}

#[tokio::test]
async fn full_run_accepts_new_tools_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    write_corpus(&config);

    let run = discover_with(CannedPages::new(), &config).await.unwrap();
    let stats = &run.outcome.stats;

    assert_eq!(stats.sources, 1);
    assert_eq!(stats.crawled, 4);
    assert_eq!(stats.errors, 2);
    assert_eq!(stats.verified, 3);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.added, 2);
    assert_eq!(
        stats.rejection_reasons.get("Description too short or not meaningful"),
        Some(&1)
    );

    let names: Vec<&str> = run
        .outcome
        .tools
        .iter()
        .map(|t| t.candidate.name.as_str())
        .collect();
    assert_eq!(names, vec!["Widgetly", "Scribeflow"]);

    let widgetly = &run.outcome.tools[0];
    assert_eq!(widgetly.verification.score, 100);
    assert_eq!(widgetly.candidate.source, SOURCE);
    assert_eq!(widgetly.candidate.website.as_deref(), Some("https://widgetly.io"));
    assert_eq!(widgetly.candidate.features.len(), 2);

    let queue = run.discovered_path.expect("review queue written");
    let queued: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(queue).unwrap()).unwrap();
    assert_eq!(queued.as_array().unwrap().len(), 2);

    assert!(run.report_path.exists());
    assert!(config.output.report_dir.join("summary.json").exists());
}

#[tokio::test]
async fn per_source_cap_limits_crawled_pages() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.crawl.sources = vec![SOURCE.to_string()];
    config.crawl.max_requests_per_source = 2;

    let workflow = DiscoveryWorkflow::new(CannedPages::new(), Vec::new(), &config).unwrap();
    let outcome = workflow.run().await;

    assert_eq!(outcome.stats.crawled, 2);
    assert_eq!(outcome.stats.errors, 0);
    assert_eq!(outcome.tools.len(), 2);
}

#[tokio::test]
async fn missing_corpus_and_no_finds_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.crawl.sources = vec![DOWN_SOURCE.to_string()];

    let run = discover_with(CannedPages::new(), &config).await.unwrap();

    assert!(run.outcome.tools.is_empty());
    assert!(run.discovered_path.is_none());
    assert!(!config.output.discovered_path.exists());
    assert_eq!(run.outcome.stats.errors, 1);
    assert!(run.report_path.exists());
}
