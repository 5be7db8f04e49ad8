// src/reporting/mod.rs

pub mod json;
pub mod markdown;

use color_eyre::eyre::Result;
use std::fs;
use std::path::PathBuf;

use crate::config::{OutputFormat, ScanConfig};
use crate::core::models::FingerprintResult;

/// Writes the requested report files under `<output>/<domain>/` and
/// returns the written paths.
pub fn write_reports(result: &FingerprintResult, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    let site_dir = config.output.join(domain_slug(&result.url));
    fs::create_dir_all(&site_dir)?;

    let mut written = Vec::new();
    if matches!(config.format, OutputFormat::Json | OutputFormat::Both) {
        let path = site_dir.join("fingerprint.json");
        json::write(&path, result)?;
        written.push(path);
    }
    if matches!(config.format, OutputFormat::Md | OutputFormat::Both) {
        let path = site_dir.join("REPORT.md");
        markdown::write(&path, result)?;
        written.push(path);
    }
    Ok(written)
}

/// Filesystem-safe directory name derived from the target host.
fn domain_slug(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
        .replace('.', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_slug_replaces_dots() {
        assert_eq!(domain_slug("https://www.example.com/a"), "www-example-com");
    }

    #[test]
    fn domain_slug_falls_back_on_garbage() {
        assert_eq!(domain_slug("not a url"), "unknown");
    }

    #[test]
    fn write_reports_honors_format() {
        let dir = std::env::temp_dir().join(format!("stackprobe-test-{}", std::process::id()));
        let config = ScanConfig {
            output: dir.clone(),
            format: OutputFormat::Json,
            ..ScanConfig::default()
        };
        let result = FingerprintResult::new("https://example.com");
        let written = write_reports(&result, &config).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("example-com/fingerprint.json"));
        fs::remove_dir_all(dir).unwrap();
    }
}
