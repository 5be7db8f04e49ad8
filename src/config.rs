// src/config.rs

use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Md,
    Both,
}

/// Runtime configuration, assembled from the CLI surface with environment
/// fallbacks. The network knobs mirror the HTTP collaborator contract:
/// the main fetch gets `timeout`, path probes get the shorter
/// `probe_timeout`, and retry/rate limiting belong to the client, never
/// to the fingerprinting engine.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: String,
    pub output: PathBuf,
    pub timeout: u64,
    pub probe_timeout: u64,
    pub user_agent: String,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub verify_ssl: bool,
    pub format: OutputFormat,
    pub verbose: bool,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            output: PathBuf::from("stackprobe-output"),
            timeout: 10,
            probe_timeout: 5,
            user_agent: std::env::var("STACKPROBE_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            rate_limit_ms: 500,
            max_retries: 3,
            retry_delay_ms: 2000,
            verify_ssl: false,
            format: OutputFormat::Both,
            verbose: false,
        }
    }
}
