// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::config::{OutputFormat, ScanConfig, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(name = "stackprobe")]
#[command(about = "Black-box technology stack fingerprinting for web targets", long_about = None)]
#[command(
    version,
    long_about = r#"
Stackprobe - HTTP Technology Stack Fingerprinter

Identifies the web server, backend language, CMS, frameworks, database
hints and WAF of a target from a single page fetch plus lightweight
path probing.

Features:
  - Server and backend identification from response headers
  - CMS detection (WordPress, Joomla, Drupal, Magento, Shopify)
  - Backend and frontend framework detection
  - Database inference from leaked error messages
  - WAF detection (Cloudflare, Akamai, AWS WAF and others)
  - JSON and Markdown reporting
"#
)]
pub struct Args {
    /// Target URL to fingerprint (must start with http:// or https://)
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Output directory for reports
    #[arg(short, long, default_value = "stackprobe-output", value_name = "DIR")]
    pub output: PathBuf,

    /// Timeout for the main page fetch in seconds
    #[arg(short, long, default_value = "10", value_name = "SECS")]
    pub timeout: u64,

    /// Timeout for individual path probes in seconds
    #[arg(long, default_value = "5", value_name = "SECS")]
    pub probe_timeout: u64,

    /// Minimum delay between requests in milliseconds
    #[arg(long, default_value = "500", value_name = "MS")]
    pub rate_limit: u64,

    /// Retry attempts per request
    #[arg(long, default_value = "3", value_name = "NUM")]
    pub retries: u32,

    /// User agent header sent with every request
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Verify TLS certificates (disabled by default, targets under test
    /// often carry self-signed certificates)
    #[arg(long)]
    pub verify_ssl: bool,

    /// Report format to write
    #[arg(long, value_enum, default_value = "both")]
    pub format: OutputFormat,

    /// Skip the remote-target authorization prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn into_config(self) -> ScanConfig {
        ScanConfig {
            target: self.target,
            output: self.output,
            timeout: self.timeout,
            probe_timeout: self.probe_timeout,
            user_agent: self.user_agent.unwrap_or_else(|| {
                std::env::var("STACKPROBE_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string())
            }),
            rate_limit_ms: self.rate_limit,
            max_retries: self.retries,
            retry_delay_ms: 2000,
            verify_ssl: self.verify_ssl,
            format: self.format,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scan_config_defaults() {
        let args = Args::parse_from(["stackprobe", "https://example.com"]);
        let config = args.into_config();
        let defaults = ScanConfig::default();
        assert_eq!(config.target, "https://example.com");
        assert_eq!(config.timeout, defaults.timeout);
        assert_eq!(config.probe_timeout, defaults.probe_timeout);
        assert_eq!(config.rate_limit_ms, defaults.rate_limit_ms);
        assert_eq!(config.max_retries, defaults.max_retries);
        assert!(!config.verify_ssl);
        assert_eq!(config.format, OutputFormat::Both);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "stackprobe",
            "https://example.com",
            "--timeout",
            "30",
            "--rate-limit",
            "0",
            "--format",
            "json",
            "--verify-ssl",
        ]);
        let config = args.into_config();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.rate_limit_ms, 0);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.verify_ssl);
    }
}
