// src/core/prober.rs

//! Lightweight reachability probing of well-known paths. Probes are
//! supplementary evidence only: a path counts solely on HTTP 200, and a
//! transport failure for one path is swallowed — the probe pass as a
//! whole never fails.

use std::time::Duration;
use tracing::debug;

use crate::core::http::HttpClient;

/// Generic paths checked during the dedicated probing phase, independent
/// of any CMS rule's own path list.
pub const COMMON_PATHS: &[&str] = &[
    "/robots.txt",
    "/sitemap.xml",
    "/.well-known/security.txt",
    "/admin",
    "/wp-admin",
    "/administrator",
    "/phpmyadmin",
];

/// Probes each path under `base` sequentially and returns the reachable
/// ones, input order preserved.
pub async fn probe_paths(
    client: &HttpClient,
    base: &str,
    paths: &[&str],
    timeout: Duration,
) -> Vec<String> {
    let mut found = Vec::new();
    for path in paths {
        let url = format!("{}{}", base.trim_end_matches('/'), path);
        let response = client.get(&url, timeout, true).await;
        if response.error.is_none() && response.status_code == 200 {
            debug!(path, "Probe path reachable.");
            found.push((*path).to_string());
        } else {
            debug!(path, status = response.status_code, "Probe path not reachable.");
        }
    }
    found
}
