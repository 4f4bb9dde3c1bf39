//! Layered configuration for discovery runs
//!
//! Values are resolved from built-in defaults, then a TOML file, then
//! `TOOL_DISCOVERY_*` environment variables (`__` separates sections, e.g.
//! `TOOL_DISCOVERY_VERIFICATION__THRESHOLD=0.8`).

use crate::crawler::CrawlerConfig;
use crate::dedup::DuplicateConfig;
use crate::error::{DiscoveryError, Result};
use crate::verifier::VerificationConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "tool-discovery.toml";

pub const ENV_PREFIX: &str = "TOOL_DISCOVERY_";

/// Scrape service key, honored when no key is configured otherwise
pub const API_KEY_ENV: &str = "FIRECRAWL_API_KEY";

/// Where discovery reads and writes its files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Existing tool directory used for duplicate detection
    pub corpus_path: PathBuf,
    /// Review queue of newly discovered tools
    pub discovered_path: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("public/data/aiToolsData.json"),
            discovered_path: PathBuf::from("discovered-tools.json"),
            report_dir: PathBuf::from("discovery-reports"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub duplicate: DuplicateConfig,
    pub verification: VerificationConfig,
    pub crawl: CrawlerConfig,
    pub output: OutputConfig,
}

impl DiscoveryConfig {
    /// Resolve configuration from all layers
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) if !p.exists() => {
                return Err(DiscoveryError::ConfigError(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let mut config = Self::figment(&file).extract::<Self>()?;

        if config.crawl.api_key.is_none() {
            config.crawl.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        config.validate()?;
        debug!("Loaded configuration: {:?}", config.redacted());
        Ok(config)
    }

    /// Provider chain without the API key fallback
    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject settings that would make every verdict meaningless
    pub fn validate(&self) -> Result<()> {
        let threshold = self.verification.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DiscoveryError::ConfigError(format!(
                "verification.threshold must be within 0.0..=1.0, got {}",
                threshold
            )));
        }

        let similarity = self.duplicate.name_similarity_threshold;
        if !(0.0..=1.0).contains(&similarity) {
            return Err(DiscoveryError::ConfigError(format!(
                "duplicate.name_similarity_threshold must be within 0.0..=1.0, got {}",
                similarity
            )));
        }

        Ok(())
    }

    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.crawl.api_key.is_some() {
            copy.crawl.api_key = Some("***".to_string());
        }
        copy
    }
}
