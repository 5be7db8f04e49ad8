// src/core/engine.rs

//! The probe controller: fetches one response from the target, runs the
//! eight detection phases over it and aggregates everything into a single
//! `FingerprintResult`. `analyze` never returns an error — an unreachable
//! target yields the default skeleton with a populated `errors` list, and
//! the caller reads failure out of the record.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::ScanConfig;
use crate::core::http::{ClientStats, FetchedResponse, HttpClient};
use crate::core::models::{
    BackendFramework, CmsInfo, Confidence, DatabaseInfo, FingerprintResult, FrameworkInfo,
    WafInfo,
};
use crate::core::prober::{probe_paths, COMMON_PATHS};
use crate::core::scorer::{
    extract_version, score_rules, select_winner, CategoryScore, Observed, CMS_WEIGHTS,
    DATABASE_WEIGHTS, FRAMEWORK_WEIGHTS, WAF_WEIGHTS,
};
use crate::core::signatures::{
    cms_probe_paths, BACKEND_FRAMEWORK_RULES, CMS_RULES, DATABASE_RULES, FRONTEND_RULES,
    SERVER_PATTERNS, WAF_RULES,
};
use crate::core::synthesis;

static RE_PHP_VERSION: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"PHP/([\d.]+)")
        .case_insensitive(true)
        .build()
        .unwrap()
});

// Session cookies that betray the backend language: (cookie token,
// recorded flag, implied language). The language only fills in when no
// stronger header evidence already set one.
const SESSION_COOKIE_HINTS: &[(&str, &str, Option<&str>)] = &[
    ("PHPSESSID", "PHPSESSID", Some("PHP")),
    ("ASP.NET_SessionId", "ASP.NET_SessionId", Some("ASP.NET")),
    ("laravel_session", "laravel_session", None),
    ("connect.sid", "connect.sid", Some("Node.js")),
    ("csrftoken", "django", Some("Python")),
    ("sessionid", "django", Some("Python")),
];

// Identifying headers copied into the result verbatim when present.
const NOTEWORTHY_HEADERS: &[&str] = &["X-Framework", "X-Generator", "X-Drupal-Cache"];

pub struct FingerprintEngine {
    client: HttpClient,
    timeout: Duration,
    probe_timeout: Duration,
}

impl FingerprintEngine {
    pub fn new(config: &ScanConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            timeout: Duration::from_secs(config.timeout),
            probe_timeout: Duration::from_secs(config.probe_timeout),
        })
    }

    /// Fingerprints one target. Phase 1 fetches the page; a fetch failure
    /// is terminal and returns the near-empty skeleton. The two probe
    /// passes run next so that phases 2-8 are a pure function of captured
    /// data: identical responses and probe outcomes always produce
    /// identical results (timestamp aside).
    pub async fn analyze(&self, url: &str) -> FingerprintResult {
        info!(url, "Starting fingerprint.");
        let mut result = FingerprintResult::new(url);

        debug!("Phase 1: initial fetch");
        let response = self.client.get(url, self.timeout, true).await;
        if let Some(error) = &response.error {
            return unreachable_result(url, error);
        }

        let base = base_url(&response.final_url).unwrap_or_else(|| url.to_string());
        let cms_reachable =
            probe_paths(&self.client, &base, &cms_probe_paths(), self.probe_timeout).await;
        let paths_found =
            probe_paths(&self.client, &base, COMMON_PATHS, self.probe_timeout).await;

        fingerprint_response(&mut result, &response, &cms_reachable, &paths_found);
        info!(summary = %result.stack_summary, confidence = %result.confidence, "Fingerprint complete.");
        result
    }

    pub fn stats(&self) -> ClientStats {
        self.client.stats()
    }
}

/// The terminal phase-1 failure shape: base URL only, default skeleton,
/// non-empty `errors`. Consumers must read this as "could not
/// fingerprint", not "fingerprinted as unknown stack".
fn unreachable_result(url: &str, error: &str) -> FingerprintResult {
    let mut result = FingerprintResult::new(url);
    result.errors.push(format!("Failed to reach target: {}", error));
    result
}

/// Phases 2-8 over one captured response plus the prober outcomes.
pub fn fingerprint_response(
    result: &mut FingerprintResult,
    response: &FetchedResponse,
    cms_reachable: &[String],
    paths_found: &[String],
) {
    result.final_url = response.final_url.clone();
    result.status_code = Some(response.status_code);

    debug!("Phase 2: header analysis");
    analyze_headers(result, &response.headers, &response.cookie_header);

    let observed = Observed {
        headers: &response.headers,
        cookie_header: &response.cookie_header,
        body: &response.body,
        reachable_paths: cms_reachable,
    };

    debug!("Phase 3: WAF detection");
    result.waf = detect_waf(&observed);

    debug!("Phase 4: CMS detection");
    result.cms = detect_cms(&observed);

    debug!("Phase 5: framework detection");
    result.framework = detect_frameworks(&observed);

    debug!("Phase 6: database detection");
    result.database = detect_database(&observed);

    debug!("Phase 7: common path probing");
    result.paths_found = paths_found.to_vec();

    debug!("Phase 8: synthesis");
    synthesis::finalize(result);
}

// --- Phase 2: Header Analysis ---

fn analyze_headers(result: &mut FingerprintResult, headers: &HeaderMap, cookie_header: &str) {
    if let Some(server) = header_str(headers, "server") {
        result
            .headers
            .insert("Server".to_string(), server.to_string());
        for entry in SERVER_PATTERNS.iter() {
            if let Some(caps) = entry.pattern.captures(server) {
                result.server.name = entry.name.to_string();
                result.server.version = caps.get(1).map(|m| m.as_str().to_string());
                break;
            }
        }
    }

    if let Some(powered_by) = header_str(headers, "x-powered-by") {
        result
            .headers
            .insert("X-Powered-By".to_string(), powered_by.to_string());
        if let Some(caps) = RE_PHP_VERSION.captures(powered_by) {
            result.backend.language = Some("PHP".to_string());
            result.backend.version = caps.get(1).map(|m| m.as_str().to_string());
        }
        if powered_by.contains("ASP.NET") {
            result.backend.language = Some("ASP.NET".to_string());
        }
        if powered_by.contains("Express") {
            result.backend.language = Some("Node.js".to_string());
        }
    }

    if let Some(aspnet_version) = header_str(headers, "x-aspnet-version") {
        result.backend.language = Some("ASP.NET".to_string());
        result.backend.version = Some(aspnet_version.to_string());
        result
            .headers
            .insert("X-AspNet-Version".to_string(), aspnet_version.to_string());
    }

    for (token, flag, language) in SESSION_COOKIE_HINTS {
        if cookie_header.contains(token) {
            if !result.cookies.iter().any(|c| c == flag) {
                result.cookies.push(flag.to_string());
            }
            if let Some(language) = language {
                if result.backend.language.is_none() {
                    result.backend.language = Some(language.to_string());
                }
            }
        }
    }

    for name in NOTEWORTHY_HEADERS {
        if let Some(value) = header_str(headers, name) {
            result.headers.insert(name.to_string(), value.to_string());
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

// --- Phases 3-6: Category Detectors ---

fn detect_waf(observed: &Observed<'_>) -> WafInfo {
    let scores = score_rules(&WAF_RULES, observed, &WAF_WEIGHTS);
    let evidence = fold_evidence(&scores);
    match select_winner(&scores) {
        Some(winner) => WafInfo {
            detected: true,
            waf_type: Some(winner.name.to_string()),
            confidence: Confidence::from_score(winner.score, 3, 2),
            evidence,
        },
        None => WafInfo::default(),
    }
}

fn detect_cms(observed: &Observed<'_>) -> CmsInfo {
    let scores = score_rules(&CMS_RULES, observed, &CMS_WEIGHTS);
    let evidence = fold_evidence(&scores);
    match select_winner(&scores) {
        Some(winner) => CmsInfo {
            name: Some(winner.name.to_string()),
            version: extract_version(winner),
            confidence: Confidence::from_score(winner.score, 4, 2),
            evidence,
        },
        None => CmsInfo::default(),
    }
}

fn detect_frameworks(observed: &Observed<'_>) -> FrameworkInfo {
    let scores = score_rules(&BACKEND_FRAMEWORK_RULES, observed, &FRAMEWORK_WEIGHTS);
    // No low tier here: any nonzero framework score reports as at least
    // medium. Preserved from the original detection tables.
    let backend = scores
        .iter()
        .filter(|candidate| candidate.score > 0)
        .map(|candidate| BackendFramework {
            name: candidate.name.to_string(),
            confidence: if candidate.score >= 2 {
                Confidence::High
            } else {
                Confidence::Medium
            },
        })
        .collect();

    let frontend = FRONTEND_RULES
        .iter()
        .filter(|rule| {
            rule.body_patterns
                .iter()
                .any(|pattern| pattern.is_match(observed.body))
        })
        .map(|rule| rule.name.to_string())
        .collect();

    FrameworkInfo { backend, frontend }
}

fn detect_database(observed: &Observed<'_>) -> DatabaseInfo {
    let scores = score_rules(&DATABASE_RULES, observed, &DATABASE_WEIGHTS);
    let evidence: Vec<String> = scores
        .iter()
        .flat_map(|candidate| {
            candidate.evidence.iter().map(|hit| {
                format!(
                    "{}: {}",
                    candidate.name,
                    hit.excerpt.as_deref().unwrap_or(&hit.label)
                )
            })
        })
        .collect();

    match select_winner(&scores) {
        Some(winner) => DatabaseInfo {
            db_type: winner.name.to_string(),
            confidence: Confidence::from_score(winner.score, 3, 2),
            evidence,
        },
        // No error pattern leaked: the type is explicitly "inferred", not
        // "unknown", so downstream consumers see the phase did run.
        None => DatabaseInfo {
            db_type: "inferred".to_string(),
            confidence: Confidence::Low,
            evidence,
        },
    }
}

/// Evidence across all candidates of a category, table iteration order.
fn fold_evidence(scores: &[CategoryScore]) -> Vec<String> {
    scores
        .iter()
        .flat_map(|candidate| candidate.evidence.iter().map(|hit| hit.describe()))
        .collect()
}

/// scheme://host[:port] of the final URL, probe requests are issued
/// relative to this.
fn base_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    fn response(
        headers: &[(&'static str, &'static str)],
        cookie_header: &str,
        body: &str,
    ) -> FetchedResponse {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        FetchedResponse {
            url: "https://example.com".to_string(),
            final_url: "https://example.com/".to_string(),
            status_code: 200,
            headers: header_map,
            cookie_header: cookie_header.to_string(),
            body: body.to_string(),
            response_time: 0.1,
            error: None,
        }
    }

    fn analyze_response(
        resp: &FetchedResponse,
        cms_reachable: &[String],
        paths_found: &[String],
    ) -> FingerprintResult {
        let mut result = FingerprintResult::new(&resp.url);
        fingerprint_response(&mut result, resp, cms_reachable, paths_found);
        result
    }

    #[test]
    fn wordpress_body_and_login_path_identify_cms() {
        let resp = response(&[], "", "<a href=\"/wp-content/themes/x/style.css\">");
        let reachable = vec!["/wp-login.php".to_string()];
        let result = analyze_response(&resp, &reachable, &[]);
        assert_eq!(result.cms.name.as_deref(), Some("wordpress"));
        assert!(result.cms.confidence.is_solid());
    }

    #[test]
    fn cloudflare_cookie_detects_waf() {
        let resp = response(&[], "__cfduid=d1a2b3c4; path=/", "<html></html>");
        let result = analyze_response(&resp, &[], &[]);
        assert!(result.waf.detected);
        assert_eq!(result.waf.waf_type.as_deref(), Some("cloudflare"));
        assert!(result.waf.confidence.is_solid());
    }

    #[test]
    fn server_header_yields_name_and_version() {
        let resp = response(&[("server", "nginx/1.18.0")], "", "");
        let result = analyze_response(&resp, &[], &[]);
        assert_eq!(result.server.name, "nginx");
        assert_eq!(result.server.version.as_deref(), Some("1.18.0"));
        assert_eq!(result.headers.get("Server").map(String::as_str), Some("nginx/1.18.0"));
    }

    #[test]
    fn powered_by_php_sets_backend_language_and_version() {
        let resp = response(&[("x-powered-by", "PHP/8.1.2")], "", "");
        let result = analyze_response(&resp, &[], &[]);
        assert_eq!(result.backend.language.as_deref(), Some("PHP"));
        assert_eq!(result.backend.version.as_deref(), Some("8.1.2"));
    }

    #[test]
    fn session_cookie_fills_backend_only_when_unset() {
        let resp = response(
            &[("x-powered-by", "PHP/8.1.2")],
            "connect.sid=abc123",
            "",
        );
        let result = analyze_response(&resp, &[], &[]);
        // Header evidence wins; the cookie flag is still recorded.
        assert_eq!(result.backend.language.as_deref(), Some("PHP"));
        assert!(result.cookies.iter().any(|c| c == "connect.sid"));
    }

    #[test]
    fn leaked_mysql_error_identifies_database() {
        let body = "Warning: You have an error in your SQL syntax near MySQL server version";
        let resp = response(&[], "", body);
        let result = analyze_response(&resp, &[], &[]);
        assert_eq!(result.database.db_type, "mysql");
        assert!(!result.database.evidence.is_empty());
    }

    #[test]
    fn clean_body_falls_back_to_inferred_database() {
        let resp = response(&[], "", "<html><body>Hello</body></html>");
        let result = analyze_response(&resp, &[], &[]);
        assert_eq!(result.database.db_type, "inferred");
        assert_eq!(result.database.confidence, Confidence::Low);
    }

    #[test]
    fn backend_framework_confidence_has_no_low_tier() {
        // A single laravel cookie hit scores 1 and must still report as
        // medium, never low.
        let resp = response(&[], "XSRF-TOKEN=tok", "");
        let result = analyze_response(&resp, &[], &[]);
        let laravel = result
            .framework
            .backend
            .iter()
            .find(|f| f.name == "laravel")
            .unwrap();
        assert_eq!(laravel.confidence, Confidence::Medium);
    }

    #[test]
    fn frontend_frameworks_are_presence_only() {
        let body = "<div data-reactroot></div><script src=\"jquery.min.js\"></script>";
        let resp = response(&[], "", body);
        let result = analyze_response(&resp, &[], &[]);
        assert!(result.framework.frontend.contains(&"react".to_string()));
        assert!(result.framework.frontend.contains(&"jquery".to_string()));
    }

    #[test]
    fn identical_inputs_produce_identical_results() {
        let resp = response(
            &[("server", "nginx/1.18.0"), ("x-powered-by", "PHP/8.1.2")],
            "PHPSESSID=s; __cfduid=x",
            "wp-content and some jquery",
        );
        let reachable = vec!["/wp-login.php".to_string()];
        let paths = vec!["/robots.txt".to_string()];

        let first = analyze_response(&resp, &reachable, &paths);
        let mut second = analyze_response(&resp, &reachable, &paths);
        second.timestamp = first.timestamp;
        assert_eq!(first, second);
    }

    #[test]
    fn unreachable_target_returns_error_skeleton() {
        let result = unreachable_result("https://example.com", "connection timed out");
        assert!(!result.errors.is_empty());
        assert!(result.cms.name.is_none());
        assert!(!result.waf.detected);
        assert!(result.technologies.is_empty());
        assert_eq!(result.stack_summary, "Unknown Stack");
        assert_eq!(result.url, "https://example.com");
    }

    #[test]
    fn synthesis_fields_are_recomputable() {
        let resp = response(
            &[("server", "nginx/1.18.0"), ("x-powered-by", "PHP/8.1.2")],
            "",
            "wp-content wp-includes",
        );
        let mut result = analyze_response(&resp, &[], &[]);
        let technologies = result.technologies.clone();
        let summary = result.stack_summary.clone();
        let confidence = result.confidence;

        synthesis::finalize(&mut result);
        assert_eq!(result.technologies, technologies);
        assert_eq!(result.stack_summary, summary);
        assert_eq!(result.confidence, confidence);
    }

    #[test]
    fn base_url_strips_path_and_keeps_port() {
        assert_eq!(
            base_url("https://example.com/a/b?q=1").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            base_url("http://localhost:8080/login").as_deref(),
            Some("http://localhost:8080")
        );
    }
}
