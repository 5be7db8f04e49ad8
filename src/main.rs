// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{error, info};
use url::Url;

mod cli;
mod config;
mod core;
mod logging;
mod reporting;

use crate::core::engine::FingerprintEngine;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = cli::Args::parse();
    let skip_prompt = args.yes;
    let config = args.into_config();
    logging::initialize_logging(config.verbose)?;

    if !config.target.starts_with("http://") && !config.target.starts_with("https://") {
        eprintln!("Target URL must start with http:// or https://");
        return Ok(ExitCode::FAILURE);
    }

    if !skip_prompt && !is_local_target(&config.target) {
        if !confirm_authorization(&config.target)? {
            info!("Scan cancelled by user.");
            println!("Scan cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let engine = match FingerprintEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client.");
            eprintln!("Failed to build HTTP client: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let result = engine.analyze(&config.target).await;
    let stats = engine.stats();

    println!();
    println!("Target:     {}", result.url);
    println!("Stack:      {}", result.stack_summary);
    println!("Confidence: {}", result.confidence);
    for tech in &result.technologies {
        println!("  - {}", tech);
    }
    if !result.errors.is_empty() {
        println!();
        for err in &result.errors {
            eprintln!("Error: {}", err);
        }
    }
    println!();
    println!(
        "Requests: {} ({} failed)",
        stats.total_requests, stats.errors
    );

    let written = reporting::write_reports(&result, &config)?;
    for path in &written {
        println!("Report: {}", path.display());
    }

    if result.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn is_local_target(target: &str) -> bool {
    Url::parse(target)
        .ok()
        .and_then(|url| url.host_str().map(|host| {
            host == "localhost" || host == "127.0.0.1" || host == "::1"
        }))
        .unwrap_or(false)
}

/// Remote targets require an explicit confirmation before any traffic is
/// sent. Unauthorized testing is illegal.
fn confirm_authorization(target: &str) -> Result<bool> {
    println!();
    println!("WARNING: You are about to probe a remote target!");
    println!();
    println!("  Target: {}", target);
    println!();
    println!("Make sure you have EXPLICIT PERMISSION to test this target.");
    print!("Do you have authorization to test this target? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_targets_skip_the_prompt() {
        assert!(is_local_target("http://localhost:8080"));
        assert!(is_local_target("http://127.0.0.1/app"));
        assert!(!is_local_target("https://example.com"));
        assert!(!is_local_target("not a url"));
    }
}
