use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::PackageRecord;

/// Severity of a reported vulnerability, roughly following CVSS bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }

    /// Sort key: lower is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Unknown => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A known vulnerability affecting one scanned package.
///
/// `purl` references the affected [`PackageRecord`] by its canonical
/// identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub purl: String,
    pub severity: Severity,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

/// A package whose resolved version lags behind the registry's latest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutdatedInfo {
    pub purl: String,
    pub current_version: String,
    pub latest_version: String,
}

/// Complete results of scanning one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub project: PathBuf,
    pub scan_time: DateTime<Utc>,
    pub packages: Vec<PackageRecord>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub outdated: Vec<OutdatedInfo>,
}

impl ScanReport {
    pub fn new(project: impl Into<PathBuf>, packages: Vec<PackageRecord>) -> Self {
        Self {
            project: project.into(),
            scan_time: Utc::now(),
            packages,
            vulnerabilities: Vec::new(),
            outdated: Vec::new(),
        }
    }

    /// The most severe vulnerability in the report, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.vulnerabilities
            .iter()
            .map(|v| v.severity)
            .min_by_key(|s| s.rank())
    }
}
