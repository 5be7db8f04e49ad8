// src/reporting/markdown.rs

use chrono::Utc;
use color_eyre::eyre::Result;
use std::fs;
use std::path::Path;

use crate::core::models::{Confidence, FingerprintResult};

pub fn write(path: &Path, result: &FingerprintResult) -> Result<()> {
    fs::write(path, render(result))?;
    Ok(())
}

pub fn render(result: &FingerprintResult) -> String {
    let mut report = Vec::new();

    report.push("# Stackprobe Fingerprint Report\n".to_string());
    report.push(format!("**Target**: {}", result.url));
    report.push(format!("**Scan Date**: {}", result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
    report.push(format!("**Overall Confidence**: {}\n", confidence_badge(result.confidence)));

    report.push("---\n## Stack Overview\n".to_string());
    report.push(format!("> {}\n", result.stack_summary));

    if !result.technologies.is_empty() {
        report.push("---\n## Detected Technologies\n".to_string());
        for tech in &result.technologies {
            report.push(format!("- {}", tech));
        }
        report.push(String::new());
    }

    report.push("---\n## Components\n".to_string());
    report.push("| Component | Value | Confidence |".to_string());
    report.push("|-----------|-------|------------|".to_string());
    report.push(format!(
        "| Server | {} | - |",
        join_name_version(&result.server.name, result.server.version.as_deref())
    ));
    report.push(format!(
        "| Backend | {} | - |",
        result
            .backend
            .language
            .as_deref()
            .map(|lang| join_name_version(lang, result.backend.version.as_deref()))
            .unwrap_or_else(|| "-".to_string())
    ));
    report.push(format!(
        "| CMS | {} | {} |",
        result
            .cms
            .name
            .as_deref()
            .map(|name| join_name_version(name, result.cms.version.as_deref()))
            .unwrap_or_else(|| "-".to_string()),
        result.cms.confidence
    ));
    report.push(format!(
        "| Database | {} | {} |",
        result.database.db_type, result.database.confidence
    ));
    report.push(format!(
        "| WAF | {} | {} |",
        result.waf.waf_type.as_deref().unwrap_or("none detected"),
        result.waf.confidence
    ));
    report.push(String::new());

    if !result.framework.backend.is_empty() || !result.framework.frontend.is_empty() {
        report.push("---\n## Frameworks\n".to_string());
        for framework in &result.framework.backend {
            report.push(format!(
                "- {} (backend, {})",
                framework.name, framework.confidence
            ));
        }
        for framework in &result.framework.frontend {
            report.push(format!("- {} (frontend)", framework));
        }
        report.push(String::new());
    }

    let evidence: Vec<&String> = result
        .cms
        .evidence
        .iter()
        .chain(result.waf.evidence.iter())
        .chain(result.database.evidence.iter())
        .collect();
    if !evidence.is_empty() {
        report.push("---\n## Evidence\n".to_string());
        report.push("```".to_string());
        for item in evidence {
            report.push(item.to_string());
        }
        report.push("```\n".to_string());
    }

    if !result.paths_found.is_empty() {
        report.push("---\n## Reachable Paths\n".to_string());
        for path in &result.paths_found {
            report.push(format!("- `{}`", path));
        }
        report.push(String::new());
    }

    if !result.errors.is_empty() {
        report.push("---\n## Errors\n".to_string());
        for error in &result.errors {
            report.push(format!("- {}", error));
        }
        report.push(String::new());
    }

    report.push("---\n".to_string());
    report.push(format!(
        "**Report Generated**: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push(format!("**Tool**: stackprobe v{}", env!("CARGO_PKG_VERSION")));

    report.join("\n")
}

fn confidence_badge(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "HIGH",
        Confidence::Medium => "MEDIUM",
        Confidence::Low => "LOW",
        Confidence::None => "NONE",
    }
}

fn join_name_version(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{} {}", name, version),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_summary_and_technologies() {
        let mut result = FingerprintResult::new("https://example.com");
        result.stack_summary = "nginx | PHP | wordpress".to_string();
        result.technologies = vec!["nginx 1.18.0".to_string(), "wordpress 6.4".to_string()];
        result.confidence = Confidence::High;

        let report = render(&result);
        assert!(report.contains("> nginx | PHP | wordpress"));
        assert!(report.contains("- nginx 1.18.0"));
        assert!(report.contains("**Overall Confidence**: HIGH"));
    }

    #[test]
    fn errors_section_appears_only_when_present() {
        let mut result = FingerprintResult::new("https://example.com");
        assert!(!render(&result).contains("## Errors"));
        result.errors.push("Failed to reach target: timeout".to_string());
        let report = render(&result);
        assert!(report.contains("## Errors"));
        assert!(report.contains("Failed to reach target: timeout"));
    }

    #[test]
    fn component_table_shows_unidentified_as_dashes() {
        let result = FingerprintResult::new("https://example.com");
        let report = render(&result);
        assert!(report.contains("| Server | Unknown | - |"));
        assert!(report.contains("| Backend | - | - |"));
        assert!(report.contains("| CMS | - | none |"));
    }
}
