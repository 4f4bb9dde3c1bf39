//! Tool records flowing through discovery
//!
//! A [`Candidate`] is what extraction produces from a crawled page, a
//! [`CorpusEntry`] is a tool already accepted into the directory, and a
//! [`VerifiedTool`] is a candidate that passed verification and is queued for
//! manual review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A tentative tool record discovered from a crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Explicit identifier; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Product name
    pub name: String,
    /// Short product description
    #[serde(default)]
    pub description: String,
    /// Official website
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Feature bullet points, in page order
    #[serde(default)]
    pub features: Vec<String>,
    /// Discovery page this candidate was found through
    #[serde(default)]
    pub source: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// The directory identifier: the explicit id, or a slug of the name
    pub fn identifier(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => slugify(&self.name),
        }
    }
}

/// A previously accepted tool from the directory's data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl CorpusEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, website: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            website: website.map(str::to_string),
        }
    }
}

/// The seven verification checks, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Check {
    #[serde(rename = "hasValidName")]
    HasValidName,
    #[serde(rename = "hasValidDescription")]
    HasValidDescription,
    #[serde(rename = "hasValidWebsite")]
    HasValidWebsite,
    #[serde(rename = "hasLegitimateFeatures")]
    HasLegitimateFeatures,
    #[serde(rename = "isNotFakePattern")]
    IsNotFakePattern,
    #[serde(rename = "hasAIIndicators")]
    HasAiIndicators,
    #[serde(rename = "hasProductContent")]
    HasProductContent,
}

impl Check {
    pub const ALL: [Check; 7] = [
        Check::HasValidName,
        Check::HasValidDescription,
        Check::HasValidWebsite,
        Check::HasLegitimateFeatures,
        Check::IsNotFakePattern,
        Check::HasAiIndicators,
        Check::HasProductContent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Check::HasValidName => "hasValidName",
            Check::HasValidDescription => "hasValidDescription",
            Check::HasValidWebsite => "hasValidWebsite",
            Check::HasLegitimateFeatures => "hasLegitimateFeatures",
            Check::IsNotFakePattern => "isNotFakePattern",
            Check::HasAiIndicators => "hasAIIndicators",
            Check::HasProductContent => "hasProductContent",
        }
    }

    /// Human-readable explanation used when the check fails
    pub fn failure_reason(&self) -> &'static str {
        match self {
            Check::HasValidName => "Invalid or generic tool name",
            Check::HasValidDescription => "Description too short or not meaningful",
            Check::HasValidWebsite => "Invalid or blacklisted website",
            Check::HasLegitimateFeatures => "No legitimate features detected",
            Check::IsNotFakePattern => "Matches fake tool patterns",
            Check::HasAiIndicators => "No AI-related terminology found",
            Check::HasProductContent => "No product indicators found",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const ALL_CHECKS_PASSED: &str = "All verification checks passed";

/// Outcome of verifying a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_verified: bool,
    /// Percentage of checks passed, rounded (0-100)
    pub score: u8,
    pub checks: BTreeMap<Check, bool>,
    pub reason: String,
}

impl VerificationResult {
    pub fn passed(&self, check: Check) -> bool {
        self.checks.get(&check).copied().unwrap_or(false)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.values().filter(|passed| **passed).count()
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = Check> + '_ {
        self.checks
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(check, _)| *check)
    }
}

/// A verified, non-duplicate tool ready for manual review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedTool {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub verification: VerificationResult,
    pub discovered_at: DateTime<Utc>,
}

/// Directory slug: lowercase, runs of non-alphanumerics collapsed to `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Jasper AI"), "jasper-ai");
        assert_eq!(slugify("  Copy.ai -- Pro!  "), "copy-ai-pro");
        assert_eq!(slugify("ChatGPT "), "chatgpt");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn identifier_prefers_explicit_id() {
        let candidate = Candidate::new("Jasper AI", "").with_id("jasper");
        assert_eq!(candidate.identifier(), "jasper");
        assert_eq!(Candidate::new("Jasper AI", "").identifier(), "jasper-ai");
    }

    #[test]
    fn checks_are_in_canonical_order() {
        let mut sorted = Check::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Check::ALL.to_vec());
    }

    #[test]
    fn verification_result_serializes_check_names() {
        let checks = Check::ALL.iter().map(|c| (*c, true)).collect();
        let result = VerificationResult {
            is_verified: true,
            score: 100,
            checks,
            reason: ALL_CHECKS_PASSED.to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["checks"]["hasAIIndicators"], true);
        assert_eq!(json["checks"]["isNotFakePattern"], true);
    }

    #[test]
    fn corpus_entry_ignores_unknown_fields() {
        let entry: CorpusEntry = serde_json::from_str(
            r#"{"id": "notion-ai", "name": "Notion AI", "website": "https://notion.so", "rating": 4.5}"#,
        )
        .unwrap();
        assert_eq!(entry.id, "notion-ai");
        assert_eq!(entry.website.as_deref(), Some("https://notion.so"));
    }
}
