use crate::core::errors::ScanError;
use crate::core::models::{Finding, ProbeMethod, Target};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const CACHE_TTL_HOURS: i64 = 24;

/// One persisted test outcome per (fingerprint, method) pair. Overwritten
/// when the same pair is re-tested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub url: String,
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub method: ProbeMethod,
    pub findings: Vec<Finding>,
    pub tested_at: DateTime<Utc>,
}

/// Persistent result cache: one JSON file per record under the data dir,
/// fronted by an in-memory map for the current run.
///
/// A lookup hit short-circuits probing for that (target, method) entirely.
/// With `bypass_reads` (--no-cache) every lookup misses but stores still
/// happen, so later default runs benefit. If the cache directory cannot be
/// created or written the cache degrades to memory-only for the run; the
/// scan itself never aborts over cache IO.
///
/// Writers are serialized by the dispatcher (the cache sits behind a mutex
/// and one fingerprint is never in flight on two workers), so records are
/// never written concurrently for the same key.
pub struct ResultCache {
    dir: Option<PathBuf>,
    ttl: Duration,
    bypass_reads: bool,
    memory: HashMap<String, CacheRecord>,
}

impl ResultCache {
    pub fn open(dir: PathBuf, bypass_reads: bool) -> Self {
        let dir = match fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                let err = ScanError::CacheIo(format!("{}: {}", dir.display(), e));
                tracing::warn!("{}; falling back to in-memory cache", err);
                None
            }
        };

        Self {
            dir,
            ttl: Duration::hours(CACHE_TTL_HOURS),
            bypass_reads,
            memory: HashMap::new(),
        }
    }

    pub fn in_memory(bypass_reads: bool) -> Self {
        Self {
            dir: None,
            ttl: Duration::hours(CACHE_TTL_HOURS),
            bypass_reads,
            memory: HashMap::new(),
        }
    }

    #[cfg(test)]
    fn with_ttl(dir: PathBuf, ttl: Duration) -> Self {
        let mut cache = Self::open(dir, false);
        cache.ttl = ttl;
        cache
    }

    pub fn is_persistent(&self) -> bool {
        self.dir.is_some()
    }

    fn key(target: &Target, method: ProbeMethod) -> String {
        let host: String = target
            .host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "{}_{}_{}_{}",
            target.scheme.as_str(),
            host,
            target.port,
            method.as_str()
        )
    }

    fn record_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.json", key)))
    }

    fn is_expired(&self, record: &CacheRecord) -> bool {
        Utc::now().signed_duration_since(record.tested_at) > self.ttl
    }

    /// Pure read. Returns the prior record for (target, method) if one
    /// exists and is still fresh.
    pub fn lookup(&mut self, target: &Target, method: ProbeMethod) -> Option<CacheRecord> {
        if self.bypass_reads {
            return None;
        }

        let key = Self::key(target, method);

        if let Some(record) = self.memory.get(&key) {
            if !self.is_expired(record) {
                return Some(record.clone());
            }
            self.memory.remove(&key);
        }

        let path = self.record_path(&key)?;
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheRecord>(&content) {
                Ok(record) if !self.is_expired(&record) => {
                    self.memory.insert(key, record.clone());
                    Some(record)
                }
                _ => {
                    // Expired or unreadable; drop the stale file
                    let _ = fs::remove_file(&path);
                    None
                }
            },
            Err(_) => {
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Append-or-replace the record for (target, method). Always updates the
    /// in-memory layer; disk write failures degrade the cache to memory-only
    /// with a single warning.
    pub fn store(
        &mut self,
        target: &Target,
        method: ProbeMethod,
        findings: Vec<Finding>,
    ) -> CacheRecord {
        let record = CacheRecord {
            url: target.url(),
            host: target.host.clone(),
            port: target.port,
            protocol: target.scheme.as_str().to_string(),
            method,
            findings,
            tested_at: Utc::now(),
        };

        let key = Self::key(target, method);
        self.memory.insert(key.clone(), record.clone());

        if let Some(path) = self.record_path(&key) {
            let result = serde_json::to_string_pretty(&record)
                .map_err(std::io::Error::other)
                .and_then(|json| fs::write(&path, json));

            if let Err(e) = result {
                let err = ScanError::CacheIo(e.to_string());
                tracing::warn!("{}; continuing with in-memory cache only", err);
                self.dir = None;
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Credential, Scheme};

    fn target() -> Target {
        Target {
            scheme: Scheme::Http,
            host: "10.0.0.1".to_string(),
            port: 80,
        }
    }

    fn finding(t: &Target) -> Finding {
        Finding::success(
            t,
            ProbeMethod::CustomBasic,
            &Credential::new("admin", "admin"),
            "HTTP 200 - authenticated",
        )
    }

    #[test]
    fn test_store_then_lookup_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ResultCache::open(dir.path().to_path_buf(), false);
        let t = target();

        assert!(cache.lookup(&t, ProbeMethod::CustomBasic).is_none());
        cache.store(&t, ProbeMethod::CustomBasic, vec![finding(&t)]);

        let hit = cache.lookup(&t, ProbeMethod::CustomBasic).unwrap();
        assert_eq!(hit.findings.len(), 1);
        assert_eq!(hit.host, "10.0.0.1");
        assert_eq!(hit.protocol, "http");

        // Methods are cached independently
        assert!(cache.lookup(&t, ProbeMethod::NmapNse).is_none());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let t = target();

        let mut cache = ResultCache::open(dir.path().to_path_buf(), false);
        cache.store(&t, ProbeMethod::NmapNse, vec![]);
        drop(cache);

        let mut reopened = ResultCache::open(dir.path().to_path_buf(), false);
        let hit = reopened.lookup(&t, ProbeMethod::NmapNse).unwrap();
        assert!(hit.findings.is_empty());
    }

    #[test]
    fn test_bypass_reads_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        let t = target();

        let mut bypassing = ResultCache::open(dir.path().to_path_buf(), true);
        bypassing.store(&t, ProbeMethod::CustomBasic, vec![finding(&t)]);
        // --no-cache forces the miss even though the record now exists
        assert!(bypassing.lookup(&t, ProbeMethod::CustomBasic).is_none());
        drop(bypassing);

        // A later default run sees the overwritten record
        let mut normal = ResultCache::open(dir.path().to_path_buf(), false);
        assert!(normal.lookup(&t, ProbeMethod::CustomBasic).is_some());
    }

    #[test]
    fn test_expired_record_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let t = target();

        let mut cache = ResultCache::with_ttl(dir.path().to_path_buf(), Duration::zero());
        cache.store(&t, ProbeMethod::CustomBasic, vec![finding(&t)]);
        assert!(cache.lookup(&t, ProbeMethod::CustomBasic).is_none());
    }

    #[test]
    fn test_unwritable_dir_degrades_to_memory() {
        // Point the cache at a path that cannot be a directory
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut cache = ResultCache::open(file.path().to_path_buf(), false);
        assert!(!cache.is_persistent());

        let t = target();
        cache.store(&t, ProbeMethod::CustomBasic, vec![finding(&t)]);
        assert!(cache.lookup(&t, ProbeMethod::CustomBasic).is_some());
    }
}
