use super::dispatcher::TargetOutcome;
use super::models::{ConfirmedCredential, Finding, ScanResult, Target};
use chrono::Utc;
use std::collections::HashMap;

/// Collects per-target outcomes as workers finish (in whatever order the
/// scheduler produced them) and renders the final result list in original
/// input order, with (username, password) pairs deduplicated across probes.
pub struct Aggregator {
    order: Vec<Target>,
    outcomes: HashMap<String, TargetOutcome>,
}

impl Aggregator {
    pub fn new(targets: &[Target]) -> Self {
        Self {
            order: targets.to_vec(),
            outcomes: HashMap::new(),
        }
    }

    /// Absorb one outcome. Absorbing the same outcome twice is harmless:
    /// findings collapse by set semantics on (username, password).
    pub fn absorb(&mut self, outcome: TargetOutcome) {
        let key = outcome.target.fingerprint();
        match self.outcomes.get_mut(&key) {
            Some(existing) => {
                existing.findings.extend(outcome.findings);
                for method in outcome.methods {
                    if !existing.methods.contains(&method) {
                        existing.methods.push(method);
                    }
                }
                existing.cache_hits += outcome.cache_hits;
                existing.errors += outcome.errors;
            }
            None => {
                self.outcomes.insert(key, outcome);
            }
        }
    }

    /// Targets that never completed (queue drained by an interrupt) are
    /// simply absent from the report.
    pub fn finish(mut self) -> Vec<ScanResult> {
        let mut results = Vec::new();

        for target in &self.order {
            let Some(outcome) = self.outcomes.remove(&target.fingerprint()) else {
                continue;
            };

            results.push(ScanResult {
                target: outcome.target,
                credentials: collapse(outcome.findings),
                methods_attempted: outcome.methods,
                completed_at: Utc::now(),
            });
        }

        results
    }
}

/// Collapse raw findings into the confirmed credential set: only successes
/// count, the first occurrence of a (username, password) pair wins its
/// evidence and timestamp, and every method that confirmed the pair is
/// retained for provenance.
fn collapse(findings: Vec<Finding>) -> Vec<ConfirmedCredential> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut by_pair: HashMap<(String, String), ConfirmedCredential> = HashMap::new();

    for finding in findings.into_iter().filter(|f| f.success) {
        let key = (finding.username.clone(), finding.password.clone());
        match by_pair.get_mut(&key) {
            Some(existing) => {
                if !existing.methods.contains(&finding.method) {
                    existing.methods.push(finding.method);
                }
            }
            None => {
                order.push(key.clone());
                by_pair.insert(
                    key,
                    ConfirmedCredential {
                        username: finding.username,
                        password: finding.password,
                        methods: vec![finding.method],
                        evidence: finding.evidence,
                        tested_at: finding.tested_at,
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .map(|key| by_pair.remove(&key).expect("tracked pair"))
        .collect()
}
