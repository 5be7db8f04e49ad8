// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- Confidence Tiers ---

// A coarse qualitative bucket derived from a numeric evidence score.
// Every confidence-carrying field in a result holds one of these values;
// "absent" is expressed as `Confidence::None`, never as a missing field.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Maps a raw evidence score onto a tier using fixed per-category
    /// thresholds. Callers only grade winners with a nonzero score, so the
    /// floor here is `Low`.
    pub fn from_score(score: u32, high_at: u32, medium_at: u32) -> Self {
        if score >= high_at {
            Confidence::High
        } else if score >= medium_at {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// True for the tiers that count as a solid identification when
    /// computing the overall fingerprint confidence.
    pub fn is_solid(&self) -> bool {
        matches!(self, Confidence::High | Confidence::Medium)
    }
}

// --- Per-Category Result Slices ---

// The web server as read from the `Server` header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: Option<String>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            version: None,
        }
    }
}

impl ServerInfo {
    pub fn is_identified(&self) -> bool {
        self.name != "Unknown"
    }
}

// The backend language inferred from headers and session cookies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendInfo {
    pub language: Option<String>,
    pub version: Option<String>,
}

// CMS identification with the evidence that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CmsInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub confidence: Confidence,
    pub evidence: Vec<String>,
}

// One scored backend framework candidate. Backend frameworks carry no
// `Low` tier: any nonzero score is reported as at least `Medium`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendFramework {
    pub name: String,
    pub confidence: Confidence,
}

// Detected frameworks, split by side. Frontend frameworks are a bare
// presence list without scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameworkInfo {
    pub backend: Vec<BackendFramework>,
    pub frontend: Vec<String>,
}

// Database engine inferred from error patterns leaking into the body.
// When nothing matches, the type is the explicit marker "inferred" at low
// confidence rather than "unknown".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseInfo {
    #[serde(rename = "type")]
    pub db_type: String,
    pub confidence: Confidence,
    pub evidence: Vec<String>,
}

impl Default for DatabaseInfo {
    fn default() -> Self {
        Self {
            db_type: "unknown".to_string(),
            confidence: Confidence::Low,
            evidence: Vec::new(),
        }
    }
}

// Web application firewall detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WafInfo {
    pub detected: bool,
    #[serde(rename = "type")]
    pub waf_type: Option<String>,
    pub confidence: Confidence,
    pub evidence: Vec<String>,
}

// --- Aggregate Fingerprint ---

// The single-owner output record of one `analyze` call. Built once,
// populated phase by phase, returned by value; `technologies`,
// `stack_summary` and `confidence` are derived purely from the other
// fields by the synthesizer and can be recomputed at any time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FingerprintResult {
    pub url: String,
    pub final_url: String,
    pub status_code: Option<u16>,
    pub server: ServerInfo,
    pub backend: BackendInfo,
    pub cms: CmsInfo,
    pub framework: FrameworkInfo,
    pub database: DatabaseInfo,
    pub waf: WafInfo,
    pub technologies: Vec<String>,
    pub stack_summary: String,
    pub confidence: Confidence,
    pub headers: BTreeMap<String, String>,
    pub cookies: Vec<String>,
    pub paths_found: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub errors: Vec<String>,
}

impl FingerprintResult {
    /// The default skeleton for a target. An unreachable target returns
    /// exactly this shape plus a non-empty `errors` list, so callers can
    /// distinguish "could not fingerprint" from "fingerprinted as unknown".
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status_code: None,
            server: ServerInfo::default(),
            backend: BackendInfo::default(),
            cms: CmsInfo::default(),
            framework: FrameworkInfo::default(),
            database: DatabaseInfo::default(),
            waf: WafInfo::default(),
            technologies: Vec::new(),
            stack_summary: "Unknown Stack".to_string(),
            confidence: Confidence::Low,
            headers: BTreeMap::new(),
            cookies: Vec::new(),
            paths_found: Vec::new(),
            timestamp: Utc::now(),
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_thresholds_map_to_tiers() {
        assert_eq!(Confidence::from_score(4, 4, 2), Confidence::High);
        assert_eq!(Confidence::from_score(3, 4, 2), Confidence::Medium);
        assert_eq!(Confidence::from_score(2, 4, 2), Confidence::Medium);
        assert_eq!(Confidence::from_score(1, 4, 2), Confidence::Low);
    }

    #[test]
    fn confidence_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Confidence::Medium).unwrap(),
            "\"medium\""
        );
        assert_eq!(Confidence::High.to_string(), "high");
    }

    #[test]
    fn skeleton_result_is_unknown_stack() {
        let result = FingerprintResult::new("http://example.com");
        assert_eq!(result.stack_summary, "Unknown Stack");
        assert!(result.technologies.is_empty());
        assert!(result.cms.name.is_none());
        assert!(!result.waf.detected);
        assert_eq!(result.database.db_type, "unknown");
        assert_eq!(result.server.name, "Unknown");
    }
}
