use crate::catalog::Catalog;
use crate::cli::args::Cli;
use crate::config::{OutputFormat, ScanConfig};
use crate::core::aggregator::Aggregator;
use crate::core::dispatcher::Dispatcher;
use crate::core::normalizer;
use crate::evasion::RateGate;
use crate::reporters::writer;
use crate::storage::cache::ResultCache;
use crate::ui::printer;
use crate::utils::logging;
use crate::{doctor, probes, update};
use anyhow::{bail, Context, Result};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn run(cli: Cli) -> Result<()> {
    let started = std::time::Instant::now();

    logging::init(logging::level_from_cli(&cli))?;

    let mut config = ScanConfig::resolve(&cli)?;

    if cli.doctor {
        doctor::print_report(&doctor::check(&config));
        return Ok(());
    }

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("cannot create data dir {}", config.data_dir.display()))?;

    if cli.update {
        let path = update::fetch_fingerprints(&config.data_dir, true).await?;
        println!("fingerprints updated: {}", path.display());
        return Ok(());
    }

    // First run convenience: pull the fingerprint database if the NSE probe
    // wants it. Failure is not fatal; nmap falls back to its bundled
    // fingerprints
    if config.nmap_enabled && config.fingerprint_file.is_none() {
        match update::fetch_fingerprints(&config.data_dir, false).await {
            Ok(path) => config.fingerprint_file = Some(path),
            Err(e) => tracing::warn!(
                "fingerprint download failed ({:#}); nmap will use its bundled fingerprints",
                e
            ),
        }
    }

    // Normalize targets up front; a run with nothing valid to scan aborts
    // before any probing
    let (targets, parse_failures) = if let Some(file) = &cli.file {
        normalizer::load_target_file(file)
            .with_context(|| format!("cannot read target file {}", file.display()))?
    } else if let Some(single) = &cli.target {
        normalizer::normalize_lines(std::iter::once(single.as_str()))
    } else {
        bail!("no target given: pass a URL or --file <path>");
    };

    if targets.is_empty() {
        bail!(
            "no valid targets ({} input lines rejected)",
            parse_failures.len()
        );
    }

    let catalog = Arc::new(match &cli.creds {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::builtin(),
    });
    let gate = Arc::new(RateGate::new(config.evasion));
    let probes = probes::resolve(&config, catalog.clone(), gate)?;

    tracing::info!(
        "scanning {} targets with {} workers ({} probes, {} catalog entries)",
        targets.len(),
        config.threads,
        probes.len(),
        catalog.len()
    );

    let store = ResultCache::open(config.cache_dir(), config.no_cache);
    let cache_persistent = store.is_persistent();
    let cache = Arc::new(Mutex::new(store));

    // Ctrl-C drains the queue: in-flight targets finish, nothing new starts,
    // and whatever reached the cache stays reusable
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; draining the work queue");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let dispatcher = Dispatcher::new(
        config.threads,
        config.timeout,
        probes,
        Arc::clone(&cache),
        Arc::clone(&shutdown),
    );
    let outcomes = dispatcher.run(targets.clone()).await;

    let mut aggregator = Aggregator::new(&targets);
    for outcome in outcomes {
        aggregator.absorb(outcome);
    }
    let results = aggregator.finish();

    let report_paths = writer::write_reports(&results, &config.outputs, &config.reports_dir())?;

    if config.outputs.contains(&OutputFormat::Terminal) {
        printer::print_findings(&results);
    }
    printer::print_summary(&printer::RunSummary {
        results: &results,
        parse_failures: &parse_failures,
        duration: started.elapsed(),
        cache_dir: &config.cache_dir(),
        cache_persistent,
        report_paths: &report_paths,
        interrupted: shutdown.load(Ordering::SeqCst),
    });

    Ok(())
}
