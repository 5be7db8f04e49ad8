// src/core/synthesis.rs

//! Derives the flattened technology list, the one-line stack summary and
//! the overall confidence tier from an otherwise populated result. All
//! three are pure functions of the record: recomputing them from a stored
//! result reproduces the original fields exactly.

use crate::core::models::{Confidence, FingerprintResult};

/// Recomputes the three derived fields in place. Runs as the final
/// pipeline phase.
pub fn finalize(result: &mut FingerprintResult) {
    result.technologies = technologies(result);
    result.stack_summary = stack_summary(result);
    result.confidence = overall_confidence(result);
}

/// The flattened technology list, in fixed order: server, backend
/// language, CMS, backend frameworks, database, WAF, frontend.
pub fn technologies(result: &FingerprintResult) -> Vec<String> {
    let mut techs = Vec::new();

    if result.server.is_identified() {
        let mut tech = result.server.name.clone();
        if let Some(version) = &result.server.version {
            tech = format!("{} {}", tech, version);
        }
        techs.push(tech);
    }

    if let Some(language) = &result.backend.language {
        let mut tech = language.clone();
        if let Some(version) = &result.backend.version {
            tech = format!("{} {}", tech, version);
        }
        techs.push(tech);
    }

    if let Some(cms) = &result.cms.name {
        let mut tech = cms.clone();
        if let Some(version) = &result.cms.version {
            tech = format!("{} {}", tech, version);
        }
        techs.push(tech);
    }

    for framework in &result.framework.backend {
        techs.push(framework.name.clone());
    }

    if result.database.db_type != "unknown" {
        let mut tech = format!("Database: {}", result.database.db_type);
        if result.database.confidence == Confidence::Low {
            tech.push_str(" (inferred)");
        }
        techs.push(tech);
    }

    if result.waf.detected {
        if let Some(waf_type) = &result.waf.waf_type {
            techs.push(format!("WAF: {}", waf_type));
        }
    }

    if !result.framework.frontend.is_empty() {
        let first_three: Vec<&str> = result
            .framework
            .frontend
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        techs.push(format!("Frontend: {}", first_three.join(", ")));
    }

    techs
}

/// One human-readable line condensing the detected stack, or the literal
/// "Unknown Stack" when nothing was identified.
pub fn stack_summary(result: &FingerprintResult) -> String {
    let mut parts = Vec::new();

    if result.server.is_identified() {
        parts.push(result.server.name.clone());
    }

    if let Some(language) = &result.backend.language {
        parts.push(language.clone());
    }

    if let Some(cms) = &result.cms.name {
        parts.push(cms.clone());
    } else if let Some(framework) = result.framework.backend.first() {
        parts.push(framework.name.clone());
    }

    if result.database.db_type != "unknown" {
        parts.push(format!("DB:{}", result.database.db_type));
    }

    if result.waf.detected {
        if let Some(waf_type) = &result.waf.waf_type {
            parts.push(format!("WAF:{}", waf_type));
        }
    }

    if parts.is_empty() {
        "Unknown Stack".to_string()
    } else {
        parts.join(" | ")
    }
}

/// Overall fingerprint confidence: how much of the stack was identified,
/// weighted toward the backend and data layers.
pub fn overall_confidence(result: &FingerprintResult) -> Confidence {
    let mut score = 0;

    if result.server.is_identified() {
        score += 1;
    }
    if result.backend.language.is_some() {
        score += 2;
    }
    if result.cms.name.is_some() && result.cms.confidence.is_solid() {
        score += 2;
    }
    if result.database.confidence.is_solid() {
        score += 2;
    }
    if !result.framework.backend.is_empty() || !result.framework.frontend.is_empty() {
        score += 1;
    }

    Confidence::from_score(score, 6, 3)
}
