use super::Probe;
use crate::core::errors::ScanError;
use crate::core::models::{Credential, Finding, ProbeMethod, Target};
use crate::executors::command::{execute, CommandResult};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Subprocess boundary for the NSE probe, injectable so tests feed canned
/// scanner output instead of spawning anything.
#[async_trait]
pub trait ScanRunner: Send + Sync {
    async fn invoke(&self, args: &[String], time_limit: Duration)
        -> Result<CommandResult, ScanError>;
}

pub struct NmapRunner {
    binary: PathBuf,
}

impl NmapRunner {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl ScanRunner for NmapRunner {
    async fn invoke(
        &self,
        args: &[String],
        time_limit: Duration,
    ) -> Result<CommandResult, ScanError> {
        execute(&self.binary.to_string_lossy(), args, time_limit).await
    }
}

/// Fingerprint-driven probe: one nmap subprocess per target running the
/// `http-default-accounts` NSE script against exactly the normalized port.
/// Once the binary turns out to be missing the probe degrades to a no-op for
/// the rest of the run, logged a single time.
pub struct NmapProbe {
    runner: Arc<dyn ScanRunner>,
    time_limit: Duration,
    fingerprint_file: Option<PathBuf>,
    unavailable: AtomicBool,
}

impl std::fmt::Debug for NmapProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NmapProbe")
            .field("time_limit", &self.time_limit)
            .field("fingerprint_file", &self.fingerprint_file)
            .field("unavailable", &self.unavailable)
            .finish_non_exhaustive()
    }
}

impl NmapProbe {
    pub fn new(
        runner: Arc<dyn ScanRunner>,
        time_limit: Duration,
        fingerprint_file: Option<PathBuf>,
    ) -> Self {
        Self {
            runner,
            time_limit,
            fingerprint_file,
            unavailable: AtomicBool::new(false),
        }
    }

    fn args_for(&self, target: &Target) -> Vec<String> {
        let mut args = vec![
            "-sT".to_string(),
            "-Pn".to_string(),
            "-n".to_string(),
            "-p".to_string(),
            target.port.to_string(),
            "--script".to_string(),
            "http-default-accounts".to_string(),
        ];

        if let Some(fp) = &self.fingerprint_file {
            args.push("--script-args".to_string());
            args.push(format!(
                "http-default-accounts.fingerprintfile={}",
                fp.display()
            ));
        }

        args.push(target.host.clone());
        args
    }
}

#[async_trait]
impl Probe for NmapProbe {
    fn name(&self) -> &'static str {
        "nmap_nse"
    }

    fn method(&self) -> ProbeMethod {
        ProbeMethod::NmapNse
    }

    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ScanError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }

        let args = self.args_for(target);
        let output = match self.runner.invoke(&args, self.time_limit).await {
            Ok(output) => output,
            Err(ScanError::Exec(e)) if e.exit_code.is_none() => {
                if !self.unavailable.swap(true, Ordering::SeqCst) {
                    tracing::warn!(
                        "nmap could not be spawned ({}); NSE probe disabled for the rest of the run",
                        e.stderr_tail
                    );
                }
                return Err(ScanError::ProbeUnavailable("nmap".to_string()));
            }
            Err(e) => return Err(e),
        };

        if !output.success() {
            tracing::debug!(
                "nmap exited with {} for {} after {}ms (treating as no findings): {}",
                output.exit_code,
                target,
                output.duration_ms,
                output.stderr.lines().last().unwrap_or("")
            );
            return Ok(Vec::new());
        }

        let findings = parse_nse_output(&output.stdout, target);
        for finding in &findings {
            tracing::info!(
                "credentials found on {}: {}:{} ({})",
                target,
                finding.username,
                finding.password,
                finding.evidence
            );
        }
        Ok(findings)
    }
}

/// Pull credential lines out of the script's report block:
///
/// ```text
/// | http-default-accounts:
/// |   [Apache Tomcat Manager] at /manager/html/
/// |     tomcat:tomcat
/// |_  [Cacti] at /cacti/index.php
/// ```
fn parse_nse_output(stdout: &str, target: &Target) -> Vec<Finding> {
    let context_re = Regex::new(r"\[([^\]]+)\] at (\S+)").expect("static regex");
    let cred_re = Regex::new(r"^\|[_ ]\s+([^\s:]+):(\S*)\s*$").expect("static regex");

    let mut findings = Vec::new();
    let mut in_section = false;
    let mut context = String::new();

    for line in stdout.lines() {
        if line.contains("http-default-accounts:") {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if !line.starts_with('|') {
            // Report block ended
            in_section = false;
            continue;
        }

        if let Some(caps) = context_re.captures(line) {
            context = format!("{} at {}", &caps[1], &caps[2]);
            continue;
        }

        if let Some(caps) = cred_re.captures(line) {
            let cred = Credential::new(&caps[1], &caps[2]);
            let evidence = if context.is_empty() {
                "reported by http-default-accounts".to_string()
            } else {
                context.clone()
            };
            findings.push(Finding::success(
                target,
                ProbeMethod::NmapNse,
                &cred,
                evidence,
            ));
        }
    }

    findings
}
