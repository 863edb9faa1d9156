use crate::core::models::ScanResult;
use crate::core::normalizer::ParseFailure;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Findings table for terminal output, one line per confirmed credential.
pub fn print_findings(results: &[ScanResult]) {
    let with_findings: Vec<&ScanResult> = results.iter().filter(|r| r.has_findings()).collect();

    if with_findings.is_empty() {
        println!("\n{}", "No default credentials found".yellow());
        return;
    }

    println!("\n{}", "Confirmed Credentials".green().bold());
    println!("{}", "─".repeat(72).dimmed());
    println!(
        "{:<32} {:<18} {:<12} {}",
        "URL".cyan().bold(),
        "Method".cyan().bold(),
        "Username".cyan().bold(),
        "Password".cyan().bold()
    );

    for result in &with_findings {
        for cred in &result.credentials {
            let methods = cred
                .methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("+");
            println!(
                "{:<32} {:<18} {:<12} {}",
                result.target.url().bright_white(),
                methods,
                cred.username.yellow(),
                cred.password.yellow()
            );
        }
    }
    println!("{}", "─".repeat(72).dimmed());
}

pub struct RunSummary<'a> {
    pub results: &'a [ScanResult],
    pub parse_failures: &'a [ParseFailure],
    pub duration: Duration,
    pub cache_dir: &'a Path,
    pub cache_persistent: bool,
    pub report_paths: &'a [PathBuf],
    pub interrupted: bool,
}

pub fn print_summary(summary: &RunSummary) {
    let with_findings = summary
        .results
        .iter()
        .filter(|r| r.has_findings())
        .count();
    let without = summary.results.len() - with_findings;

    println!("\n{}", "═".repeat(48).green().bold());
    println!("{}", "Scan Complete".green().bold());
    println!("{}", "═".repeat(48).green().bold());

    println!(
        "  Duration: {}",
        format!("{:.2}s", summary.duration.as_secs_f64()).bright_white()
    );
    println!(
        "  Targets with credentials: {}",
        with_findings.to_string().green().bold()
    );
    println!("  Targets clean: {}", without.to_string().bright_white());

    if !summary.parse_failures.is_empty() {
        println!(
            "  Skipped input lines: {}",
            summary.parse_failures.len().to_string().red()
        );
        for failure in summary.parse_failures.iter().take(5) {
            println!(
                "    line {}: {} ({})",
                failure.line_no,
                failure.line.dimmed(),
                failure.reason.dimmed()
            );
        }
    }
    if summary.interrupted {
        println!("  {}", "Interrupted: remaining targets were not scanned".red());
    }

    if summary.cache_persistent {
        println!("  Cache: {}", summary.cache_dir.display().to_string().dimmed());
    } else {
        println!("  Cache: {}", "in-memory only (results not persisted)".dimmed());
    }
    for path in summary.report_paths {
        println!("  Report: {}", path.display().to_string().dimmed());
    }
    println!("{}", "═".repeat(48).green().bold());
}
