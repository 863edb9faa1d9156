use crate::config::FINGERPRINTS_FILE;
use crate::utils::fs::atomic_write;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const FINGERPRINTS_URL: &str =
    "https://raw.githubusercontent.com/nnposter/nndefaccts/master/http-default-accounts-fingerprints-nndefaccts.lua";

/// Fetch the nndefaccts fingerprint database into the data directory. With
/// `force` the file is re-downloaded even when already present.
pub async fn fetch_fingerprints(data_dir: &Path, force: bool) -> Result<PathBuf> {
    let dest = data_dir.join(FINGERPRINTS_FILE);

    if dest.exists() && !force {
        tracing::debug!("fingerprints already present: {}", dest.display());
        return Ok(dest);
    }

    tracing::info!("downloading fingerprints from {}", FINGERPRINTS_URL);

    let body = reqwest::get(FINGERPRINTS_URL)
        .await
        .context("fingerprint download failed")?
        .error_for_status()
        .context("fingerprint download rejected")?
        .text()
        .await
        .context("fingerprint download truncated")?;

    atomic_write(&dest, body.as_bytes())?;
    tracing::info!("fingerprints written to {}", dest.display());

    Ok(dest)
}
