//! Candidate extraction from scraped pages
//!
//! Discovery pages yield links to tool pages; tool pages yield the name,
//! description, features and website of a [`Candidate`]. Every extracted
//! field is filtered through the same rules the verifier applies, so the
//! first plausible value wins.

use crate::crawler::ScrapedPage;
use crate::rules::CompiledRules;
use crate::tool::Candidate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use url::Url;

/// Maximum features kept per candidate
const MAX_FEATURES: usize = 8;

/// A link from a discovery page that looks like it leads to a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLink {
    pub name: String,
    pub url: String,
}

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\]\[]{3,50})\]\((https?://[^)\s]+)\)").expect("invalid link regex")
    })
}

fn image_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\.(png|jpe?g|gif|svg|webp|ico)$").expect("invalid image regex")
    })
}

fn heading_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^#\s*([A-Z][A-Za-z0-9 .-]{2,40}?)\s*$").expect("invalid heading regex")
    })
}

fn product_suffix_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([A-Z][A-Za-z0-9 .]+?)\s*[-–—]\s*(?:AI|Tool|Software|Platform)\b")
            .expect("invalid product name regex")
    })
}

fn sentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([A-Z][^.\n]{29,299}\.)").expect("invalid sentence regex")
    })
}

fn feature_section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\W*(?:key\s+)?(?:features?|capabilities|capability|benefits?)\W*\n((?:\s*[•*-]\s*[^\n]+\n?)+)")
            .expect("invalid feature section regex")
    })
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*[•*-]\s*(.+?)\s*$").expect("invalid bullet regex"))
}

fn official_site_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:official\s+website|homepage)[:\s]+<?\[?[^\]\n]*\]?\(?(https?://[^\s)>]+)")
            .expect("invalid official site regex")
    })
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Extracts candidates from scraped pages
pub struct Extractor {
    rules: Arc<CompiledRules>,
}

impl Extractor {
    pub fn new(rules: Arc<CompiledRules>) -> Self {
        Self { rules }
    }

    /// Links on a discovery page that plausibly lead to tool pages
    ///
    /// Keeps markdown links whose text passes the name check, whose URL is
    /// not an image, and whose host differs from the discovery page's host.
    /// De-duplicated by URL, in document order.
    pub fn extract_tool_links(&self, markdown: &str, source_url: &str) -> Vec<ToolLink> {
        let Some(source_host) = Url::parse(source_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for caps in markdown_link_re().captures_iter(markdown) {
            let is_image = caps
                .get(0)
                .is_some_and(|m| markdown[..m.start()].ends_with('!'));
            let name = caps[1].trim();
            let url = caps[2].trim();

            if is_image || !self.rules.has_valid_name(name) {
                continue;
            }
            if !looks_like_tool_page(url, &source_host) {
                continue;
            }
            if seen.insert(url.to_string()) {
                links.push(ToolLink {
                    name: name.to_string(),
                    url: url.to_string(),
                });
            }
        }

        debug!("Found {} tool links on {}", links.len(), source_url);
        links
    }

    /// Build a candidate from a tool page, falling back to the link text
    pub fn extract_candidate(&self, page: &ScrapedPage, link: &ToolLink, source: &str) -> Candidate {
        let document = page.html.as_deref().map(Html::parse_document);

        let name = self
            .extract_name(document.as_ref(), &page.markdown)
            .unwrap_or_else(|| link.name.clone());
        let description = self
            .extract_description(document.as_ref(), &page.markdown)
            .unwrap_or_default();
        let features = self.extract_features(document.as_ref(), &page.markdown);
        let website = self.extract_website(document.as_ref(), &page.markdown, &link.url);

        Candidate {
            id: None,
            name,
            description,
            website,
            features,
            source: source.to_string(),
        }
    }

    pub fn extract_name(&self, document: Option<&Html>, markdown: &str) -> Option<String> {
        let mut candidates: Vec<String> = Vec::new();

        if let Some(doc) = document {
            if let Some(title) = first_text(doc, "title") {
                let title = title
                    .split(['|', '–', '—'])
                    .next()
                    .unwrap_or_default()
                    .split(" - ")
                    .next()
                    .unwrap_or_default()
                    .to_string();
                candidates.push(title);
            }
            if let Some(h1) = first_text(doc, "h1") {
                candidates.push(h1);
            }
        }

        candidates.extend(
            heading_name_re()
                .captures(markdown)
                .map(|c| c[1].to_string()),
        );
        candidates.extend(
            product_suffix_name_re()
                .captures(markdown)
                .map(|c| c[1].to_string()),
        );

        candidates
            .iter()
            .map(|raw| clean_name(raw))
            .find(|name| self.rules.has_valid_name(name))
    }

    pub fn extract_description(&self, document: Option<&Html>, markdown: &str) -> Option<String> {
        let mut candidates: Vec<String> = Vec::new();

        if let Some(doc) = document {
            for css in ["meta[name='description']", "meta[property='og:description']"] {
                if let Some(content) = first_attr(doc, css, "content") {
                    candidates.push(content);
                }
            }
        }

        candidates.extend(
            sentence_re()
                .captures_iter(markdown)
                .map(|c| c[1].trim().to_string()),
        );

        if let Some(doc) = document {
            if let Some(h2) = first_text(doc, "h2") {
                candidates.push(h2);
            }
        }

        candidates
            .into_iter()
            .map(|d| collapse_whitespace(&d))
            .find(|d| d.chars().count() <= 300 && self.rules.has_valid_description(d))
    }

    pub fn extract_features(&self, document: Option<&Html>, markdown: &str) -> Vec<String> {
        let mut raw: Vec<String> = Vec::new();

        for section in feature_section_re().captures_iter(markdown) {
            for bullet in bullet_re().captures_iter(&section[1]) {
                raw.push(bullet[1].to_string());
            }
        }

        if let Some(doc) = document {
            for list in doc.select(&selector("ul")) {
                raw.extend(flat_list_items(list));
            }
        }

        let mut seen = HashSet::new();
        raw.into_iter()
            .map(|f| collapse_whitespace(&f))
            .filter(|f| (10..=100).contains(&f.chars().count()))
            .filter(|f| self.rules.is_legitimate_feature(f))
            .filter(|f| seen.insert(f.clone()))
            .take(MAX_FEATURES)
            .collect()
    }

    pub fn extract_website(
        &self,
        document: Option<&Html>,
        markdown: &str,
        page_url: &str,
    ) -> Option<String> {
        let mut candidates: Vec<String> = Vec::new();

        if let Some(doc) = document {
            candidates.extend(first_attr(doc, "link[rel='canonical']", "href"));
            candidates.extend(first_attr(doc, "meta[property='og:url']", "content"));
        }
        candidates.extend(
            official_site_re()
                .captures(markdown)
                .map(|c| c[1].to_string()),
        );
        candidates.push(page_url.to_string());

        candidates
            .into_iter()
            .map(|url| url.trim().to_string())
            .find(|url| self.rules.has_valid_website(Some(url)))
    }
}

fn looks_like_tool_page(url: &str, source_host: &str) -> bool {
    if image_url_re().is_match(url) {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().is_some_and(|host| host != source_host),
        Err(_) => false,
    }
}

/// Text of a content list's plain `<li>` children
///
/// Lists inside page chrome, and lists with fewer than two items that carry
/// no nested markup, yield nothing.
fn flat_list_items(list: ElementRef<'_>) -> Vec<String> {
    let in_chrome = list
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| matches!(el.value().name(), "nav" | "header" | "footer"));
    if in_chrome {
        return Vec::new();
    }

    let items: Vec<String> = list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .filter(|li| !li.children().any(|node| node.value().is_element()))
        .map(|li| li.text().collect::<String>())
        .collect();

    if items.len() < 2 {
        Vec::new()
    } else {
        items
    }
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip logo/icon suffixes and leading articles from a scraped name
fn clean_name(raw: &str) -> String {
    let mut name = collapse_whitespace(raw);

    for suffix in [" Logo", " Icon", " logo", " icon"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
        }
    }
    for article in ["The ", "A ", "An "] {
        if let Some(stripped) = name.strip_prefix(article) {
            name = stripped.to_string();
            break;
        }
    }

    name.trim().to_string()
}
