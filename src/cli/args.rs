use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "credprobe",
    version,
    about = "Default credential scanner for HTTP(S) targets"
)]
pub struct Cli {
    /// Target URL for a one-off scan; use --file for batches
    pub target: Option<String>,

    /// File with one target per line (# comments and blank lines ignored)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Worker pool size
    #[arg(short = 't', long = "threads", default_value_t = 20)]
    pub threads: usize,

    /// Per-probe timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    pub timeout: u64,

    /// Enable the nmap NSE probe (default)
    #[arg(long = "nmap", action = ArgAction::SetTrue, conflicts_with = "no_nmap")]
    pub nmap: bool,

    /// Disable the nmap NSE probe
    #[arg(long = "no-nmap", action = ArgAction::SetTrue)]
    pub no_nmap: bool,

    /// Enable the built-in credential prober (default)
    #[arg(long = "custom", action = ArgAction::SetTrue, conflicts_with = "no_custom")]
    pub custom: bool,

    /// Disable the built-in credential prober
    #[arg(long = "no-custom", action = ArgAction::SetTrue)]
    pub no_custom: bool,

    /// Ignore cached results on read (fresh results are still written)
    #[arg(long = "no-cache", action = ArgAction::SetTrue)]
    pub no_cache: bool,

    /// Randomized request delays and User-Agent rotation
    #[arg(long = "evasion", action = ArgAction::SetTrue)]
    pub evasion: bool,

    /// Try every catalog entry instead of stopping at the first hit
    #[arg(long = "all-creds", action = ArgAction::SetTrue)]
    pub all_creds: bool,

    /// Credential file (username:password per line) replacing the built-in catalog
    #[arg(long = "creds")]
    pub creds: Option<PathBuf>,

    /// Output formats: terminal,csv,html (comma-separated)
    #[arg(short = 'o', long = "output", default_value = "terminal")]
    pub output: String,

    /// Verbose output (-v findings, -vv misses too)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Check external dependencies and exit
    #[arg(long = "doctor", action = ArgAction::SetTrue)]
    pub doctor: bool,

    /// Refresh the fingerprint database and exit
    #[arg(long = "update", action = ArgAction::SetTrue)]
    pub update: bool,
}
