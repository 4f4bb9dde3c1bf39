//! Heuristic vocabularies for spotting fake tool listings
//!
//! The vocabularies are plain data so they can be tuned from the config file
//! without a rebuild. [`VerificationRules::compile`] turns them into a
//! [`CompiledRules`], which owns the regexes and implements the individual
//! synchronous checks used by both the verifier and the extractor.

use crate::error::{DiscoveryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Raw, serializable vocabularies and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationRules {
    /// Names matching any of these are navigation, pricing tiers, categories,
    /// superlatives, symbols or calls to action rather than products
    pub fake_name_patterns: Vec<String>,
    /// Exact (case-insensitive) names too generic to be a product
    pub generic_names: Vec<String>,
    pub min_name_length: usize,
    /// A description must match at least one of these
    pub meaningful_description_patterns: Vec<String>,
    pub min_description_length: usize,
    /// Descriptions matching any of these are page chrome, not copy
    pub fake_description_patterns: Vec<String>,
    /// Descriptions at or below this length are treated as fake
    pub max_fake_description_length: usize,
    /// Hosts (and their subdomains) that are never a tool's own website
    pub blacklisted_domains: Vec<String>,
    /// Fallback when no features were extracted
    pub feature_indicator_pattern: String,
    pub min_feature_length: usize,
    /// Features starting with these (case-insensitive) are sentence fragments
    pub feature_stray_prefixes: Vec<String>,
    pub ai_terms: Vec<String>,
    pub product_indicators: Vec<String>,
    pub min_product_indicators: usize,
}

impl Default for VerificationRules {
    fn default() -> Self {
        Self {
            fake_name_patterns: strings(&[
                r"(?i)^(home|about|contact|privacy|terms|blog|news|support|login|register|search|menu|button)$",
                r"(?i)^(free|freemium|premium|paid|trial|basic|pro|enterprise|starter)$",
                r"(?i)^(ai|tools?|software|platform|app|service|solution)$",
                r"(?i)^(new|popular|trending|featured|recommended|best|top)$",
                r"^[\d\s\W]+$",
                r"^.{1,2}$",
                r"(?i)^(click here|learn more|get started|try now|sign up|view all)$",
            ]),
            generic_names: strings(&["ai tool", "software", "platform", "app", "service"]),
            min_name_length: 3,
            meaningful_description_patterns: strings(&[
                r"(?i)\b(help|assist|automate|generate|create|analyze|optimize|improve|enhance|streamline)\b",
                r"(?i)\b(business|marketing|content|data|customer|sales|productivity|workflow)\b",
                r"(?i)\b(ai|artificial intelligence|machine learning|automation)\b",
            ]),
            min_description_length: 30,
            fake_description_patterns: strings(&[
                r"(?i)^(search for|click|button|link|menu|navigation)",
                r"(?i)^(terms|privacy|policy|cookie)",
            ]),
            max_fake_description_length: 10,
            blacklisted_domains: strings(&[
                "google.com",
                "facebook.com",
                "twitter.com",
                "linkedin.com",
                "cookiedatabase.org",
                "example.com",
                "localhost",
                "aixploria.com",
                "opentools.ai",
                "dang.ai",
                "futuretools.io",
            ]),
            feature_indicator_pattern: r"(?i)\b(feature|capability|function|tool|integration|api)\b"
                .to_string(),
            min_feature_length: 10,
            feature_stray_prefixes: strings(&["and ", "the ", "a ", "an "]),
            ai_terms: strings(&[
                "artificial intelligence",
                "ai",
                "machine learning",
                "ml",
                "deep learning",
                "neural network",
                "nlp",
                "natural language",
                "computer vision",
                "automation",
                "intelligent",
                "smart",
                "predictive",
                "generative",
            ]),
            product_indicators: strings(&[
                "pricing",
                "plans",
                "features",
                "dashboard",
                "api",
                "integration",
                "signup",
                "login",
                "trial",
                "demo",
                "documentation",
                "support",
            ]),
            min_product_indicators: 2,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile(p)).collect()
}

impl VerificationRules {
    /// Compile every pattern, failing on the first invalid one
    pub fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            fake_names: compile_all(&self.fake_name_patterns)?,
            generic_names: self.generic_names.iter().map(|s| s.to_lowercase()).collect(),
            min_name_length: self.min_name_length,
            meaningful_descriptions: compile_all(&self.meaningful_description_patterns)?,
            min_description_length: self.min_description_length,
            fake_descriptions: compile_all(&self.fake_description_patterns)?,
            max_fake_description_length: self.max_fake_description_length,
            blacklisted_domains: self
                .blacklisted_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            feature_indicator: compile(&self.feature_indicator_pattern)?,
            min_feature_length: self.min_feature_length,
            feature_stray_prefixes: self
                .feature_stray_prefixes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            symbols_only: compile(r"^[\d\s\W]+$")?,
            ai_terms: self.ai_terms.iter().map(|s| s.to_lowercase()).collect(),
            product_indicators: self
                .product_indicators
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            min_product_indicators: self.min_product_indicators,
        })
    }
}

/// Compiled vocabularies plus the pure checks built on them
#[derive(Debug, Clone)]
pub struct CompiledRules {
    fake_names: Vec<Regex>,
    generic_names: Vec<String>,
    min_name_length: usize,
    meaningful_descriptions: Vec<Regex>,
    min_description_length: usize,
    fake_descriptions: Vec<Regex>,
    max_fake_description_length: usize,
    blacklisted_domains: Vec<String>,
    feature_indicator: Regex,
    min_feature_length: usize,
    feature_stray_prefixes: Vec<String>,
    symbols_only: Regex,
    ai_terms: Vec<String>,
    product_indicators: Vec<String>,
    min_product_indicators: usize,
}

impl CompiledRules {
    /// Whether the name matches any fake-name pattern
    pub fn is_fake_name(&self, name: &str) -> bool {
        let name = name.trim();
        self.fake_names.iter().any(|re| re.is_match(name))
    }

    pub fn has_valid_name(&self, name: &str) -> bool {
        if name.trim().is_empty() || self.is_fake_name(name) {
            return false;
        }

        if name.chars().count() < self.min_name_length
            || !name.chars().any(|c| c.is_ascii_alphabetic())
        {
            return false;
        }

        let lower = name.to_lowercase();
        !self.generic_names.iter().any(|term| *term == lower)
    }

    pub fn has_valid_description(&self, description: &str) -> bool {
        if description.chars().count() < self.min_description_length {
            return false;
        }

        self.meaningful_descriptions
            .iter()
            .any(|re| re.is_match(description))
    }

    /// URL syntax and blacklist validation, without touching the network
    pub fn has_valid_website(&self, website: Option<&str>) -> bool {
        let Some(website) = website else {
            return false;
        };
        let Ok(url) = Url::parse(website.trim()) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        if self.is_blacklisted_host(&host) {
            return false;
        }

        host.contains('.') && !host.ends_with(".local")
    }

    fn is_blacklisted_host(&self, host: &str) -> bool {
        self.blacklisted_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// A single feature bullet that reads like real product copy
    pub fn is_legitimate_feature(&self, feature: &str) -> bool {
        let lower = feature.to_lowercase();

        feature.chars().count() > self.min_feature_length
            && !self
                .feature_stray_prefixes
                .iter()
                .any(|prefix| lower.starts_with(prefix.as_str()))
            && !lower.contains("http")
            && !self.symbols_only.is_match(feature)
    }

    pub fn has_legitimate_features(&self, features: &[String], description: &str) -> bool {
        if features.is_empty() {
            return self.feature_indicator.is_match(description);
        }

        let legit = features
            .iter()
            .filter(|f| self.is_legitimate_feature(f))
            .count();
        let required = features.len().div_ceil(2).min(2);

        legit >= required
    }

    pub fn is_not_fake_pattern(&self, name: &str, description: &str) -> bool {
        if self.is_fake_name(name) {
            return false;
        }

        if description.trim().chars().count() <= self.max_fake_description_length {
            return false;
        }

        !self
            .fake_descriptions
            .iter()
            .any(|re| re.is_match(description))
    }

    pub fn has_ai_indicators(&self, description: &str, content: &str) -> bool {
        let text = combined_lowercase(description, content);
        self.ai_terms.iter().any(|term| text.contains(term.as_str()))
    }

    pub fn has_product_content(&self, description: &str, content: &str) -> bool {
        let text = combined_lowercase(description, content);
        let matches = self
            .product_indicators
            .iter()
            .filter(|indicator| text.contains(indicator.as_str()))
            .count();

        matches >= self.min_product_indicators
    }
}

fn combined_lowercase(description: &str, content: &str) -> String {
    format!("{} {}", description, content).to_lowercase()
}
