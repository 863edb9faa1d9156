use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write via a temp file and rename so report and data files are never
/// observed half-written.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid path: no parent directory"))?;

    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {:?}", parent))?;
    }

    let tmp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create temp file {:?}", tmp_path))?;
    file.write_all(content)
        .with_context(|| format!("failed to write {:?}", tmp_path))?;
    file.sync_all()
        .with_context(|| format!("failed to sync {:?}", tmp_path))?;

    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename {:?} to {:?}", tmp_path, path))?;

    Ok(())
}
