pub mod custom;
pub mod nmap;
pub mod transport;

use crate::catalog::Catalog;
use crate::config::ScanConfig;
use crate::core::errors::ScanError;
use crate::core::models::{Finding, ProbeMethod, Target};
use crate::evasion::RateGate;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Uniform contract for the two probing strategies. The probe set is
/// resolved once at startup from the CLI flags; the dispatcher iterates the
/// resolved list instead of branching on flags per target.
#[async_trait]
pub trait Probe: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn method(&self) -> ProbeMethod;

    /// Test one target, returning confirmed findings only. Errors are
    /// recoverable per target; `ProbeUnavailable` additionally means the
    /// probe has degraded to a no-op for the rest of the run.
    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ScanError>;
}

/// Resolve the enabled flags into the active probe list. Fails with a
/// configuration error when nothing is left to run: a missing nmap binary
/// with the custom prober disabled leaves zero effective probes.
pub fn resolve(
    config: &ScanConfig,
    catalog: Arc<Catalog>,
    gate: Arc<RateGate>,
) -> Result<Vec<Arc<dyn Probe>>, ScanError> {
    let nmap_binary = if config.nmap_enabled {
        match which::which("nmap") {
            Ok(path) => Some(path),
            Err(_) => {
                tracing::warn!("nmap binary not found; the NSE probe will not run");
                None
            }
        }
    } else {
        None
    };

    resolve_with(config, catalog, gate, nmap_binary)
}

fn resolve_with(
    config: &ScanConfig,
    catalog: Arc<Catalog>,
    gate: Arc<RateGate>,
    nmap_binary: Option<PathBuf>,
) -> Result<Vec<Arc<dyn Probe>>, ScanError> {
    let mut probes: Vec<Arc<dyn Probe>> = Vec::new();

    if let Some(binary) = nmap_binary {
        let runner = Arc::new(nmap::NmapRunner::new(binary));
        probes.push(Arc::new(nmap::NmapProbe::new(
            runner,
            config.timeout,
            config.fingerprint_file.clone(),
        )));
    }

    if config.custom_enabled {
        if catalog.is_empty() {
            tracing::warn!("credential catalog is empty; skipping the custom prober");
        } else {
            let transport = Arc::new(transport::ReqwestTransport::new(config.timeout)?);
            probes.push(Arc::new(custom::CustomProbe::new(
                catalog,
                transport,
                gate,
                config.all_creds,
            )));
        }
    }

    if probes.is_empty() {
        return Err(ScanError::FatalConfig(
            "no probes available: enable --custom or install nmap".to_string(),
        ));
    }

    Ok(probes)
}
