use crate::cli::args::Cli;
use crate::core::errors::ScanError;
use std::path::PathBuf;
use std::time::Duration;

pub const FINGERPRINTS_FILE: &str = "http-default-accounts-fingerprints-nndefaccts.lua";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Csv,
    Html,
}

/// Immutable run configuration, resolved once from the CLI before any
/// probing begins. All fatal-configuration checks live here so a bad flag
/// combination aborts with a clear diagnostic instead of mid-scan.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub threads: usize,
    pub timeout: Duration,
    pub nmap_enabled: bool,
    pub custom_enabled: bool,
    pub no_cache: bool,
    pub evasion: bool,
    pub all_creds: bool,
    pub outputs: Vec<OutputFormat>,
    pub data_dir: PathBuf,
    pub fingerprint_file: Option<PathBuf>,
}

impl ScanConfig {
    pub fn resolve(cli: &Cli) -> Result<Self, ScanError> {
        if cli.threads == 0 {
            return Err(ScanError::FatalConfig(
                "--threads must be at least 1".to_string(),
            ));
        }
        if cli.timeout == 0 {
            return Err(ScanError::FatalConfig(
                "--timeout must be at least 1 second".to_string(),
            ));
        }

        // --nmap/--custom are affirmations of the defaults; the negative
        // flags conflict with them at the parser level
        let nmap_enabled = cli.nmap || !cli.no_nmap;
        let custom_enabled = cli.custom || !cli.no_custom;
        if !nmap_enabled && !custom_enabled {
            return Err(ScanError::FatalConfig(
                "both probes disabled: drop one of --no-nmap / --no-custom".to_string(),
            ));
        }

        let mut outputs = Vec::new();
        for format in cli.output.split(',') {
            match format.trim().to_lowercase().as_str() {
                "terminal" => outputs.push(OutputFormat::Terminal),
                "csv" => outputs.push(OutputFormat::Csv),
                "html" => outputs.push(OutputFormat::Html),
                "" => {}
                other => {
                    return Err(ScanError::FatalConfig(format!(
                        "unknown output format '{}' (expected terminal, csv or html)",
                        other
                    )));
                }
            }
        }
        if outputs.is_empty() {
            outputs.push(OutputFormat::Terminal);
        }

        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("credprobe");

        let fingerprint_path = data_dir.join(FINGERPRINTS_FILE);
        let fingerprint_file = fingerprint_path.exists().then_some(fingerprint_path);

        Ok(Self {
            threads: cli.threads,
            timeout: Duration::from_secs(cli.timeout),
            nmap_enabled,
            custom_enabled,
            no_cache: cli.no_cache,
            evasion: cli.evasion,
            all_creds: cli.all_creds,
            outputs,
            data_dir,
            fingerprint_file,
        })
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

#[cfg(test)]
pub fn test_config() -> ScanConfig {
    ScanConfig {
        threads: 4,
        timeout: Duration::from_secs(5),
        nmap_enabled: true,
        custom_enabled: true,
        no_cache: false,
        evasion: false,
        all_creds: false,
        outputs: vec![OutputFormat::Terminal],
        data_dir: PathBuf::from("."),
        fingerprint_file: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("credprobe").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::resolve(&cli(&["http://10.0.0.1"])).unwrap();
        assert_eq!(config.threads, 20);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.nmap_enabled);
        assert!(config.custom_enabled);
        assert_eq!(config.outputs, vec![OutputFormat::Terminal]);
    }

    #[test]
    fn test_both_probes_disabled_is_fatal() {
        let err = ScanConfig::resolve(&cli(&["x", "--no-nmap", "--no-custom"])).unwrap_err();
        assert!(matches!(err, ScanError::FatalConfig(_)));
    }

    #[test]
    fn test_zero_threads_is_fatal() {
        let err = ScanConfig::resolve(&cli(&["x", "--threads", "0"])).unwrap_err();
        assert!(matches!(err, ScanError::FatalConfig(_)));
    }

    #[test]
    fn test_output_list_parses() {
        let config = ScanConfig::resolve(&cli(&["x", "--output", "csv, html"])).unwrap();
        assert_eq!(config.outputs, vec![OutputFormat::Csv, OutputFormat::Html]);
    }

    #[test]
    fn test_unknown_output_is_fatal() {
        let err = ScanConfig::resolve(&cli(&["x", "--output", "pdf"])).unwrap_err();
        assert!(matches!(err, ScanError::FatalConfig(_)));
    }
}
