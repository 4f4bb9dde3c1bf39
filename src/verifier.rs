//! Tool verification module
//!
//! Runs the full battery of checks over a scraped candidate and turns the
//! results into a scored verdict with a readable rejection reason.

use crate::error::{DiscoveryError, Result};
use crate::rules::{CompiledRules, VerificationRules};
use crate::tool::{Candidate, Check, VerificationResult, ALL_CHECKS_PASSED};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Verification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Minimum fraction of checks that must pass
    pub threshold: f64,
    /// Checks that must pass regardless of the overall score
    pub required_checks: Vec<Check>,
    /// Probe the website over HTTP in addition to syntax validation
    pub probe_websites: bool,
    pub probe_timeout_secs: u64,
    pub rules: VerificationRules,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.70,
            required_checks: vec![Check::HasValidName],
            probe_websites: false,
            probe_timeout_secs: 5,
            rules: VerificationRules::default(),
        }
    }
}

/// Live reachability check for a tool's website
pub struct WebsiteProbe {
    client: Client,
}

impl WebsiteProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; tool-discovery/0.1)")
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::FetchError {
                url: "probe_init".to_string(),
                source: e,
            })?;

        Ok(Self { client })
    }

    /// Whether the site answers a HEAD request with a non-error status
    ///
    /// Any transport error or timeout counts as unreachable.
    pub async fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("Probe {} -> {}", url, status);
                !(status.is_client_error() && status.as_u16() != 405) && !status.is_server_error()
            }
            Err(e) => {
                warn!("Website probe failed for {}: {}", url, e);
                false
            }
        }
    }
}

/// Structured cache key; avoids ambiguity of concatenated strings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    website: Option<String>,
}

impl CacheKey {
    fn of(candidate: &Candidate) -> Self {
        Self {
            name: candidate.name.clone(),
            website: candidate.website.clone(),
        }
    }
}

/// Candidate verifier
pub struct Verifier {
    rules: Arc<CompiledRules>,
    threshold: f64,
    required_checks: Vec<Check>,
    probe: Option<WebsiteProbe>,
    cache: Mutex<HashMap<CacheKey, Arc<VerificationResult>>>,
}

impl Verifier {
    /// Create a verifier with default rules and thresholds
    pub fn new() -> Result<Self> {
        Self::with_config(&VerificationConfig::default())
    }

    /// Create a verifier from configuration, compiling its rules
    pub fn with_config(config: &VerificationConfig) -> Result<Self> {
        let rules = Arc::new(config.rules.compile()?);
        let probe = if config.probe_websites {
            Some(WebsiteProbe::new(Duration::from_secs(config.probe_timeout_secs))?)
        } else {
            None
        };

        Ok(Self {
            rules,
            threshold: config.threshold,
            required_checks: config.required_checks.clone(),
            probe,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Compiled rules, shared with the extractor
    pub fn rules(&self) -> Arc<CompiledRules> {
        Arc::clone(&self.rules)
    }

    /// Verify a candidate against the raw page content it was scraped from
    ///
    /// Results are cached per `(name, website)` for the lifetime of the
    /// verifier; a repeat call returns the same shared result.
    pub async fn verify(&self, candidate: &Candidate, content: &str) -> Arc<VerificationResult> {
        let key = CacheKey::of(candidate);
        if let Some(cached) = self.cached(&key) {
            debug!("Verification cache hit for '{}'", candidate.name);
            return cached;
        }

        let website_ok = self.check_website(candidate.website.as_deref()).await;
        let result = Arc::new(self.evaluate(candidate, content, website_ok));

        info!(
            "Verified '{}': {} (score: {})",
            candidate.name,
            if result.is_verified { "accepted" } else { "rejected" },
            result.score
        );

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(cache.entry(key).or_insert(result))
    }

    fn cached(&self, key: &CacheKey) -> Option<Arc<VerificationResult>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    async fn check_website(&self, website: Option<&str>) -> bool {
        if !self.rules.has_valid_website(website) {
            return false;
        }

        match (&self.probe, website) {
            (Some(probe), Some(url)) => probe.is_reachable(url).await,
            _ => true,
        }
    }

    /// Run the synchronous checks and score them
    fn evaluate(&self, candidate: &Candidate, content: &str, website_ok: bool) -> VerificationResult {
        let rules = &self.rules;
        let description = candidate.description.as_str();

        let checks: BTreeMap<Check, bool> = Check::ALL
            .iter()
            .map(|check| {
                let passed = match check {
                    Check::HasValidName => rules.has_valid_name(&candidate.name),
                    Check::HasValidDescription => rules.has_valid_description(description),
                    Check::HasValidWebsite => website_ok,
                    Check::HasLegitimateFeatures => {
                        rules.has_legitimate_features(&candidate.features, description)
                    }
                    Check::IsNotFakePattern => {
                        rules.is_not_fake_pattern(&candidate.name, description)
                    }
                    Check::HasAiIndicators => rules.has_ai_indicators(description, content),
                    Check::HasProductContent => rules.has_product_content(description, content),
                };
                debug!("  {} = {}", check, passed);
                (*check, passed)
            })
            .collect();

        let passed = checks.values().filter(|p| **p).count();
        let ratio = passed as f64 / checks.len() as f64;
        let score = (ratio * 100.0).round() as u8;

        let required_ok = self
            .required_checks
            .iter()
            .all(|check| checks.get(check).copied().unwrap_or(false));
        let is_verified = required_ok && ratio >= self.threshold;

        let reason = verification_reason(&checks);

        VerificationResult {
            is_verified,
            score,
            checks,
            reason,
        }
    }
}

/// Failed checks' messages in canonical order, or the all-clear message
fn verification_reason(checks: &BTreeMap<Check, bool>) -> String {
    let failed: Vec<&str> = checks
        .iter()
        .filter(|(_, passed)| !**passed)
        .map(|(check, _)| check.failure_reason())
        .collect();

    if failed.is_empty() {
        ALL_CHECKS_PASSED.to_string()
    } else {
        failed.join("; ")
    }
}
