// src/core/scorer.rs

//! Generic weighted-evidence scorer. Each category detector feeds its rule
//! table and the observed response through `score_rules`, then picks a
//! winner with `select_winner`. Evidence order follows table iteration
//! order, and ties always resolve to the earliest-declared candidate.

use reqwest::header::HeaderMap;

use crate::core::signatures::SignatureRule;

// --- Evidence ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Header,
    Cookie,
    Pattern,
    Path,
}

/// One concrete observed match contributing to a candidate's score.
/// `captured` holds the first non-empty regex capture group (used for
/// version extraction); `excerpt` holds the matched body text for display.
#[derive(Debug, Clone)]
pub struct EvidenceHit {
    pub kind: EvidenceKind,
    pub label: String,
    pub captured: Option<String>,
    pub excerpt: Option<String>,
}

impl EvidenceHit {
    /// Human-readable form used when folding evidence into a result field.
    pub fn describe(&self) -> String {
        match self.kind {
            EvidenceKind::Header => format!("Header: {}", self.label),
            EvidenceKind::Cookie => format!("Cookie: {}", self.label),
            EvidenceKind::Pattern => format!("Pattern: {}", truncate(&self.label, 50)),
            EvidenceKind::Path => format!("Path: {}", self.label),
        }
    }
}

/// Per-candidate accumulator: total weighted score plus the hits behind it.
#[derive(Debug, Clone)]
pub struct CategoryScore {
    pub name: &'static str,
    pub score: u32,
    pub evidence: Vec<EvidenceHit>,
}

// --- Scoring Weights ---

/// Evidence weights for one category. The asymmetries are part of the
/// detection contract: a WAF betrays itself through headers and cookies,
/// a CMS mostly through body markup, a database only through leaked
/// error strings.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub header: u32,
    pub cookie: u32,
    pub body: u32,
    pub path: u32,
}

pub const WAF_WEIGHTS: Weights = Weights { header: 2, cookie: 2, body: 1, path: 0 };
pub const CMS_WEIGHTS: Weights = Weights { header: 2, cookie: 1, body: 2, path: 1 };
pub const FRAMEWORK_WEIGHTS: Weights = Weights { header: 2, cookie: 1, body: 1, path: 0 };
pub const DATABASE_WEIGHTS: Weights = Weights { header: 0, cookie: 0, body: 1, path: 0 };

// --- Observed Response ---

/// The signals one analysis call scores against: response headers, the raw
/// Set-Cookie value (multi-cookie, matched as substrings — never parsed
/// into discrete cookies), the body text, and the well-known paths the
/// prober found reachable.
pub struct Observed<'a> {
    pub headers: &'a HeaderMap,
    pub cookie_header: &'a str,
    pub body: &'a str,
    pub reachable_paths: &'a [String],
}

// --- Scoring ---

/// Scores every rule in a table against one observed response, in table
/// order. Rules that match nothing still produce a zero-score entry so the
/// caller sees the full candidate field.
pub fn score_rules(
    rules: &[SignatureRule],
    observed: &Observed<'_>,
    weights: &Weights,
) -> Vec<CategoryScore> {
    rules
        .iter()
        .map(|rule| score_rule(rule, observed, weights))
        .collect()
}

fn score_rule(rule: &SignatureRule, observed: &Observed<'_>, weights: &Weights) -> CategoryScore {
    let mut score = 0;
    let mut evidence = Vec::new();

    for token in rule.header_tokens {
        if header_name_contains(observed.headers, token) {
            score += weights.header;
            evidence.push(EvidenceHit {
                kind: EvidenceKind::Header,
                label: token.to_string(),
                captured: None,
                excerpt: None,
            });
        }
    }

    for token in rule.cookie_tokens {
        if observed.cookie_header.contains(token) {
            score += weights.cookie;
            evidence.push(EvidenceHit {
                kind: EvidenceKind::Cookie,
                label: token.to_string(),
                captured: None,
                excerpt: None,
            });
        }
    }

    for pattern in &rule.body_patterns {
        if let Some(caps) = pattern.captures(observed.body) {
            score += weights.body;
            let captured = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty());
            let excerpt = caps.get(0).map(|m| truncate(m.as_str(), 100));
            evidence.push(EvidenceHit {
                kind: EvidenceKind::Pattern,
                label: pattern.as_str().to_string(),
                captured,
                excerpt,
            });
        }
    }

    for path in rule.paths {
        if observed.reachable_paths.iter().any(|found| found == path) {
            score += weights.path;
            evidence.push(EvidenceHit {
                kind: EvidenceKind::Path,
                label: path.to_string(),
                captured: None,
                excerpt: None,
            });
        }
    }

    CategoryScore {
        name: rule.name,
        score,
        evidence,
    }
}

/// Selects the candidate with the maximal nonzero score. Ties resolve to
/// the earliest entry: only a strictly greater score displaces the current
/// winner, so declaration order is the deterministic tie-break.
pub fn select_winner<'a>(scores: &'a [CategoryScore]) -> Option<&'a CategoryScore> {
    let mut winner: Option<&CategoryScore> = None;
    for candidate in scores {
        if candidate.score > 0 && winner.is_none_or(|w| candidate.score > w.score) {
            winner = Some(candidate);
        }
    }
    winner
}

/// The first non-empty capture group among the winner's matched patterns,
/// in evidence order. No capturing group anywhere means no version.
pub fn extract_version(winner: &CategoryScore) -> Option<String> {
    winner.evidence.iter().find_map(|hit| hit.captured.clone())
}

/// Case-insensitive substring match of a token against header *names*.
fn header_name_contains(headers: &HeaderMap, token: &str) -> bool {
    let needle = token.to_ascii_lowercase();
    headers
        .keys()
        .any(|name| name.as_str().contains(&needle))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
