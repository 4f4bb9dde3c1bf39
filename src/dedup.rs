//! Duplicate detection against the existing tool directory

use crate::similarity::similarity;
use crate::tool::{Candidate, CorpusEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Duplicate detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Names scoring strictly above this are considered the same tool
    pub name_similarity_threshold: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            name_similarity_threshold: 0.80,
        }
    }
}

/// Which signal flagged a candidate; only surfaced in logs
#[derive(Debug, Clone, PartialEq)]
enum DuplicateSignal<'a> {
    ExactId(&'a str),
    SimilarName { existing: &'a str, score: f64 },
    SameDomain(&'a str),
}

struct IndexedEntry {
    name_lower: String,
    domain: Option<String>,
}

/// Detects candidates already present in a corpus snapshot
///
/// The corpus is owned by the detector for the duration of a run and never
/// modified. Lowercased names and extracted domains are computed once here.
pub struct DuplicateDetector {
    corpus: Vec<CorpusEntry>,
    ids: HashSet<String>,
    index: Vec<IndexedEntry>,
    config: DuplicateConfig,
}

impl DuplicateDetector {
    pub fn new(corpus: Vec<CorpusEntry>) -> Self {
        Self::with_config(corpus, DuplicateConfig::default())
    }

    pub fn with_config(corpus: Vec<CorpusEntry>, config: DuplicateConfig) -> Self {
        let ids = corpus.iter().map(|e| e.id.clone()).collect();
        let index = corpus
            .iter()
            .map(|e| IndexedEntry {
                name_lower: e.name.to_lowercase(),
                domain: e.website.as_deref().and_then(extract_domain),
            })
            .collect();

        Self {
            corpus,
            ids,
            index,
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Whether the candidate matches an existing tool by id, name or domain
    pub fn is_duplicate(&self, candidate: &Candidate) -> bool {
        match self.find_signal(candidate) {
            Some(signal) => {
                debug!("Duplicate '{}': {:?}", candidate.name, signal);
                true
            }
            None => false,
        }
    }

    fn find_signal(&self, candidate: &Candidate) -> Option<DuplicateSignal<'_>> {
        // 1. Exact id
        let id = candidate.identifier();
        if !id.is_empty() {
            if let Some(existing) = self.ids.get(&id) {
                return Some(DuplicateSignal::ExactId(existing));
            }
        }

        // 2. Fuzzy name
        let name_lower = candidate.name.to_lowercase();
        for (entry, indexed) in self.corpus.iter().zip(&self.index) {
            if indexed.name_lower.is_empty() {
                continue;
            }
            let score = similarity(&name_lower, &indexed.name_lower);
            if score > self.config.name_similarity_threshold {
                return Some(DuplicateSignal::SimilarName {
                    existing: &entry.name,
                    score,
                });
            }
        }

        // 3. Domain
        let domain = candidate.website.as_deref().and_then(extract_domain)?;
        self.corpus
            .iter()
            .zip(&self.index)
            .find(|(_, indexed)| indexed.domain.as_deref() == Some(domain.as_str()))
            .map(|(entry, _)| DuplicateSignal::SameDomain(&entry.id))
    }
}

/// Host of a URL with a single leading `www.` removed
///
/// Malformed URLs and URLs without a host yield `None`.
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<CorpusEntry> {
        vec![
            CorpusEntry::new("chatgpt", "ChatGPT", Some("https://chat.openai.com")),
            CorpusEntry::new("jasper-ai", "Jasper AI", Some("https://www.jasper.ai/")),
            CorpusEntry::new("mystery", "", Some("not a url")),
        ]
    }

    #[test]
    fn exact_id_wins_regardless_of_name() {
        let detector = DuplicateDetector::new(corpus());
        let candidate = Candidate::new("Completely Different", "").with_id("jasper-ai");
        assert!(detector.is_duplicate(&candidate));
    }

    #[test]
    fn derived_slug_matches_existing_id() {
        let detector = DuplicateDetector::new(vec![CorpusEntry::new("copy-ai", "Copy Tool", None)]);
        assert!(detector.is_duplicate(&Candidate::new("Copy.ai", "")));
    }

    #[test]
    fn near_identical_names_are_duplicates() {
        let detector = DuplicateDetector::new(corpus());
        assert!(detector.is_duplicate(&Candidate::new("ChatGPT ", "").with_id("x")));
        assert!(detector.is_duplicate(&Candidate::new("jasper ai", "").with_id("y")));
    }

    #[test]
    fn threshold_is_exclusive_and_configurable() {
        // "abcde" vs "abcdx" scores exactly 0.8
        let corpus = vec![CorpusEntry::new("abcde", "abcde", None)];
        let detector = DuplicateDetector::new(corpus.clone());
        assert!(!detector.is_duplicate(&Candidate::new("abcdx", "")));

        let lenient = DuplicateDetector::with_config(
            corpus,
            DuplicateConfig {
                name_similarity_threshold: 0.5,
            },
        );
        assert!(lenient.is_duplicate(&Candidate::new("abcdx", "")));
    }

    #[test]
    fn same_domain_ignores_www_and_path() {
        let detector =
            DuplicateDetector::new(vec![CorpusEntry::new("tool", "Tool Thing", Some("https://www.tool.com"))]);
        let candidate = Candidate::new("Entirely Unrelated", "")
            .with_id("other")
            .with_website("https://tool.com/pricing");
        assert!(detector.is_duplicate(&candidate));
    }

    #[test]
    fn malformed_urls_never_match() {
        let detector = DuplicateDetector::new(corpus());
        let candidate = Candidate::new("Brand New Thing", "")
            .with_id("brand-new")
            .with_website("not a url");
        assert!(!detector.is_duplicate(&candidate));
    }

    #[test]
    fn unique_candidate_passes() {
        let detector = DuplicateDetector::new(corpus());
        let candidate = Candidate::new("Widgetly", "").with_website("https://widgetly.io");
        assert!(!detector.is_duplicate(&candidate));
    }

    #[test]
    fn empty_corpus_has_no_duplicates() {
        let detector = DuplicateDetector::new(Vec::new());
        assert!(detector.is_empty());
        assert!(!detector.is_duplicate(&Candidate::new("Anything", "")));
    }

    #[test]
    fn extract_domain_strips_www_once() {
        assert_eq!(extract_domain("https://www.tool.com/x").as_deref(), Some("tool.com"));
        assert_eq!(extract_domain("https://app.tool.com").as_deref(), Some("app.tool.com"));
        assert_eq!(extract_domain("HTTPS://WWW.Tool.COM").as_deref(), Some("tool.com"));
        assert_eq!(extract_domain("tool.com"), None);
        assert_eq!(extract_domain("mailto:someone@tool.com"), None);
    }
}
