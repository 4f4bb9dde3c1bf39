//! JSON-file persistence for the tool directory and review queue
//!
//! The directory corpus is read once per run. Newly discovered tools are
//! written to a separate file for manual review; nothing here ever writes
//! back into the corpus.

use crate::error::Result;
use crate::tool::{CorpusEntry, VerifiedTool};
use std::path::Path;
use tracing::{info, warn};

/// Load the existing tool corpus
///
/// A missing file is an empty corpus. A file that exists but does not parse
/// is an error, since silently treating it as empty would let every tool
/// through as new.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusEntry>> {
    let path = path.as_ref();

    if !path.exists() {
        warn!("Corpus file not found at {}, starting empty", path.display());
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<CorpusEntry> = serde_json::from_str(&raw)?;

    info!("Loaded {} existing tools from {}", entries.len(), path.display());
    Ok(entries)
}

/// Write discovered tools for review, replacing any previous queue file
pub fn save_discovered<P: AsRef<Path>>(path: P, tools: &[VerifiedTool]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(tools)?;
    std::fs::write(path, json)?;

    info!("Saved {} discovered tools to {}", tools.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use crate::tool::{Candidate, Check, VerificationResult};
    use chrono::Utc;

    #[test]
    fn missing_corpus_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_corpus(dir.path().join("absent.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn malformed_corpus_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_corpus(&path),
            Err(DiscoveryError::SerializationError(_))
        ));
    }

    #[test]
    fn unreadable_corpus_is_a_file_system_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_corpus(dir.path()),
            Err(DiscoveryError::FsError(_))
        ));
    }

    #[test]
    fn loads_directory_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "jasper-ai", "name": "Jasper AI", "website": "https://jasper.ai", "category": "Writing"},
                {"id": "orphan"}
            ]"#,
        )
        .unwrap();

        let entries = load_corpus(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Jasper AI");
        assert_eq!(entries[1].website, None);
    }

    #[test]
    fn saves_review_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("discovered-tools.json");
        let tool = VerifiedTool {
            candidate: Candidate::new("Widgetly", "Support automation").with_website("https://widgetly.io"),
            verification: VerificationResult {
                is_verified: true,
                score: 100,
                checks: Check::ALL.iter().map(|c| (*c, true)).collect(),
                reason: "All verification checks passed".to_string(),
            },
            discovered_at: Utc::now(),
        };

        save_discovered(&path, &[tool]).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["name"], "Widgetly");
        assert_eq!(written[0]["verification"]["score"], 100);
    }
}
