use super::models::{Finding, ProbeMethod, Target};
use crate::core::errors::ScanError;
use crate::probes::Probe;
use crate::storage::cache::ResultCache;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

/// Everything one worker learned about one target. Sent to the aggregator
/// as soon as the target finishes, in completion order.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target: Target,
    pub methods: Vec<ProbeMethod>,
    pub findings: Vec<Finding>,
    pub cache_hits: usize,
    pub errors: usize,
}

/// Bounded worker pool over a shared queue of normalized targets.
///
/// Each worker holds at most one target at a time, and each target is
/// dequeued exactly once, so a fingerprint is never probed by two workers
/// concurrently; cache-write correctness of the whole run rests on that.
/// The stop flag drains the queue: in-flight targets finish, nothing
/// new is dequeued, and partial cache writes stay valid for the next run.
pub struct Dispatcher {
    workers: usize,
    probe_timeout: Duration,
    probes: Vec<Arc<dyn Probe>>,
    cache: Arc<Mutex<ResultCache>>,
    shutdown: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(
        workers: usize,
        probe_timeout: Duration,
        probes: Vec<Arc<dyn Probe>>,
        cache: Arc<Mutex<ResultCache>>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            workers,
            probe_timeout,
            probes,
            cache,
            shutdown,
        }
    }

    pub async fn run(&self, targets: Vec<Target>) -> Vec<TargetOutcome> {
        let total = targets.len();
        let queue = Arc::new(StdMutex::new(VecDeque::from(targets)));
        let (tx, mut rx) = mpsc::unbounded_channel::<TargetOutcome>();

        let pool_size = self.workers.min(total.max(1));
        let mut handles = Vec::with_capacity(pool_size);

        for worker_id in 0..pool_size {
            let queue = Arc::clone(&queue);
            let probes = self.probes.clone();
            let cache = Arc::clone(&self.cache);
            let shutdown = Arc::clone(&self.shutdown);
            let probe_timeout = self.probe_timeout;
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if shutdown.load(Ordering::SeqCst) {
                        tracing::debug!("worker {} stopping: queue draining", worker_id);
                        break;
                    }

                    let next = queue.lock().expect("queue lock").pop_front();
                    let Some(target) = next else { break };

                    let outcome =
                        process_target(&target, &probes, &cache, probe_timeout).await;
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        let _ = futures::future::join_all(handles).await;

        outcomes
    }
}

/// One target's pipeline: per enabled probe, cache lookup, probe on miss,
/// cache write. A cache hit short-circuits the probe entirely, with no
/// network or subprocess activity. Probe failures and timeouts are written back as
/// tested-with-no-findings so re-runs stay idempotent; an unavailable probe
/// writes nothing (the target was never actually tested by it).
async fn process_target(
    target: &Target,
    probes: &[Arc<dyn Probe>],
    cache: &Arc<Mutex<ResultCache>>,
    probe_timeout: Duration,
) -> TargetOutcome {
    let mut findings = Vec::new();
    let mut methods = Vec::new();
    let mut cache_hits = 0;
    let mut errors = 0;

    if probes.is_empty() {
        tracing::warn!("no probes enabled; {} completes with no findings", target);
    }

    for probe in probes {
        let method = probe.method();
        methods.push(method);

        let cached = cache.lock().await.lookup(target, method);
        if let Some(record) = cached {
            tracing::debug!("cache hit for {} ({})", target, method);
            cache_hits += 1;
            findings.extend(record.findings.into_iter().filter(|f| f.success));
            continue;
        }

        let (tested, fresh) = match timeout(probe_timeout, probe.run(target)).await {
            Ok(Ok(fresh)) => (true, fresh),
            Ok(Err(ScanError::ProbeUnavailable(tool))) => {
                tracing::debug!("{} skipped for {}: {} unavailable", probe.name(), target, tool);
                errors += 1;
                (false, Vec::new())
            }
            Ok(Err(e)) => {
                tracing::warn!("{} failed for {}: {}", probe.name(), target, e);
                errors += 1;
                (true, Vec::new())
            }
            Err(_) => {
                tracing::warn!(
                    "{} timed out for {} after {:?}",
                    probe.name(),
                    target,
                    probe_timeout
                );
                errors += 1;
                (true, Vec::new())
            }
        };

        if tested {
            cache.lock().await.store(target, method, fresh.clone());
            findings.extend(fresh);
        }
    }

    TargetOutcome {
        target: target.clone(),
        methods,
        findings,
        cache_hits,
        errors,
    }
}
