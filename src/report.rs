//! Discovery run statistics and JSON reports

use crate::error::Result;
use crate::tool::VerifiedTool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Counters collected over a discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    /// Discovery sources successfully scraped
    pub sources: usize,
    /// Tool pages scraped
    pub crawled: usize,
    pub verified: usize,
    pub rejected: usize,
    pub duplicates: usize,
    /// Verified, unique tools queued for review
    pub added: usize,
    pub errors: usize,
    /// How often each failure reason appeared among rejections
    #[serde(default)]
    pub rejection_reasons: BTreeMap<String, usize>,
}

impl DiscoveryStats {
    pub fn record_rejection(&mut self, reason: &str) {
        self.rejected += 1;
        for part in reason.split("; ").filter(|p| !p.is_empty()) {
            *self.rejection_reasons.entry(part.to_string()).or_insert(0) += 1;
        }
    }

    /// Share of crawled pages that verified, as a percentage
    pub fn verification_rate(&self) -> f64 {
        percentage(self.verified, self.crawled)
    }

    /// Share of verified tools that were already known, as a percentage
    pub fn duplicate_rate(&self) -> f64 {
        percentage(self.duplicates, self.verified)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 1000.0).round() / 10.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub verification_score: u8,
    pub source: String,
}

impl From<&VerifiedTool> for ToolSummary {
    fn from(tool: &VerifiedTool) -> Self {
        Self {
            name: tool.candidate.name.clone(),
            description: truncate_description(&tool.candidate.description, 100),
            website: tool.candidate.website.clone(),
            verification_score: tool.verification.score,
            source: tool.candidate.source.clone(),
        }
    }
}

fn truncate_description(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }
    let truncated: String = description.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// A single run's report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub timestamp: DateTime<Utc>,
    pub stats: DiscoveryStats,
    pub verification_rate: f64,
    pub duplicate_rate: f64,
    pub tools: Vec<ToolSummary>,
}

impl DiscoveryReport {
    pub fn new(stats: &DiscoveryStats, tools: &[VerifiedTool]) -> Self {
        Self {
            timestamp: Utc::now(),
            stats: stats.clone(),
            verification_rate: stats.verification_rate(),
            duplicate_rate: stats.duplicate_rate(),
            tools: tools.iter().map(ToolSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReportIndex {
    reports: Vec<ReportIndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportIndexEntry {
    timestamp: DateTime<Utc>,
    file: String,
    stats: DiscoveryStats,
}

/// Write the report into `report_dir` and append it to `summary.json`
///
/// Returns the path of the new report file.
pub fn write_report<P: AsRef<Path>>(report_dir: P, report: &DiscoveryReport) -> Result<PathBuf> {
    let report_dir = report_dir.as_ref();
    std::fs::create_dir_all(report_dir)?;

    let file_name = format!("report-{}.json", report.timestamp.timestamp_millis());
    let report_path = report_dir.join(&file_name);
    std::fs::write(&report_path, serde_json::to_string_pretty(report)?)?;

    let summary_path = report_dir.join("summary.json");
    let mut index: ReportIndex = if summary_path.exists() {
        serde_json::from_str(&std::fs::read_to_string(&summary_path)?)?
    } else {
        ReportIndex::default()
    };
    index.reports.push(ReportIndexEntry {
        timestamp: report.timestamp,
        file: file_name,
        stats: report.stats.clone(),
    });
    std::fs::write(&summary_path, serde_json::to_string_pretty(&index)?)?;

    info!("Report saved to: {}", report_path.display());
    Ok(report_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reasons_are_tallied() {
        let mut stats = DiscoveryStats::default();
        stats.record_rejection("Invalid or generic tool name; No product indicators found");
        stats.record_rejection("No product indicators found");

        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.rejection_reasons["No product indicators found"], 2);
        assert_eq!(stats.rejection_reasons["Invalid or generic tool name"], 1);
    }

    #[test]
    fn rates_handle_zero_denominators() {
        let stats = DiscoveryStats::default();
        assert_eq!(stats.verification_rate(), 0.0);

        let stats = DiscoveryStats {
            crawled: 3,
            verified: 2,
            duplicates: 1,
            ..Default::default()
        };
        assert_eq!(stats.verification_rate(), 66.7);
        assert_eq!(stats.duplicate_rate(), 50.0);
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "x".repeat(150);
        assert_eq!(truncate_description(&long, 100).len(), 103);
        assert_eq!(truncate_description("short", 100), "short");
    }

    #[test]
    fn summary_accumulates_reports() {
        let dir = tempfile::tempdir().unwrap();
        let stats = DiscoveryStats {
            crawled: 1,
            ..Default::default()
        };

        let mut first = DiscoveryReport::new(&stats, &[]);
        first.timestamp = DateTime::from_timestamp_millis(1_000).unwrap();
        let mut second = DiscoveryReport::new(&stats, &[]);
        second.timestamp = DateTime::from_timestamp_millis(2_000).unwrap();

        let path = write_report(dir.path(), &first).unwrap();
        write_report(dir.path(), &second).unwrap();

        assert!(path.ends_with("report-1000.json"));
        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["reports"].as_array().unwrap().len(), 2);
        assert_eq!(summary["reports"][1]["file"], "report-2000.json");
    }
}
