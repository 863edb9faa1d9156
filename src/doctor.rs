use crate::config::ScanConfig;
use colored::Colorize;
use std::path::PathBuf;
use which::which;

const NSE_SCRIPT_LOCATIONS: &[&str] = &[
    "/usr/share/nmap/scripts/http-default-accounts.nse",
    "/usr/local/share/nmap/scripts/http-default-accounts.nse",
];

pub struct DependencyStatus {
    pub name: &'static str,
    pub found: bool,
    pub detail: String,
    pub hint: &'static str,
}

/// Inspect external dependencies without touching the network: the nmap
/// binary, its http-default-accounts NSE script, and the downloaded
/// fingerprint database.
pub fn check(config: &ScanConfig) -> Vec<DependencyStatus> {
    let mut statuses = Vec::new();

    match which("nmap") {
        Ok(path) => statuses.push(DependencyStatus {
            name: "nmap",
            found: true,
            detail: path.display().to_string(),
            hint: "",
        }),
        Err(_) => statuses.push(DependencyStatus {
            name: "nmap",
            found: false,
            detail: "not in PATH".to_string(),
            hint: "install with: sudo apt install nmap (or brew install nmap)",
        }),
    }

    match NSE_SCRIPT_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    {
        Some(path) => statuses.push(DependencyStatus {
            name: "http-default-accounts.nse",
            found: true,
            detail: path.display().to_string(),
            hint: "",
        }),
        None => statuses.push(DependencyStatus {
            name: "http-default-accounts.nse",
            found: false,
            detail: "not found in nmap script directories".to_string(),
            hint: "install the nmap scripts package",
        }),
    }

    match &config.fingerprint_file {
        Some(path) => statuses.push(DependencyStatus {
            name: "fingerprint database",
            found: true,
            detail: path.display().to_string(),
            hint: "",
        }),
        None => statuses.push(DependencyStatus {
            name: "fingerprint database",
            found: false,
            detail: "not downloaded (nmap falls back to its bundled fingerprints)".to_string(),
            hint: "run: credprobe --update",
        }),
    }

    statuses
}

pub fn print_report(statuses: &[DependencyStatus]) {
    println!("{}", "Dependency check".cyan().bold());

    for status in statuses {
        if status.found {
            println!("  {} {}: {}", "✓".green().bold(), status.name, status.detail);
        } else {
            println!("  {} {}: {}", "✗".red().bold(), status.name, status.detail);
            if !status.hint.is_empty() {
                println!("      {}", status.hint.dimmed());
            }
        }
    }
}
