use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// A normalized scan target. Immutable once built by the normalizer;
/// host is lowercase and port is always explicit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Canonical cache/dedup key: `scheme://host:port`.
    pub fn fingerprint(&self) -> String {
        format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }

    pub fn url(&self) -> String {
        self.fingerprint()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeMethod {
    NmapNse,
    CustomBasic,
}

impl ProbeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeMethod::NmapNse => "nmap-nse",
            ProbeMethod::CustomBasic => "custom-basic",
        }
    }
}

impl std::fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// One credential-test outcome produced by a probe. Never mutated after
/// creation; only success=true findings survive aggregation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Finding {
    pub fingerprint: String,
    pub method: ProbeMethod,
    pub username: String,
    pub password: String,
    pub success: bool,
    pub evidence: String,
    pub tested_at: DateTime<Utc>,
}

impl Finding {
    pub fn success(
        target: &Target,
        method: ProbeMethod,
        cred: &Credential,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            fingerprint: target.fingerprint(),
            method,
            username: cred.username.clone(),
            password: cred.password.clone(),
            success: true,
            evidence: evidence.into(),
            tested_at: Utc::now(),
        }
    }
}

/// Aggregated view of one confirmed credential: the same (username, password)
/// pair reported by both probes collapses into one entry with both methods.
#[derive(Clone, Debug, Serialize)]
pub struct ConfirmedCredential {
    pub username: String,
    pub password: String,
    pub methods: Vec<ProbeMethod>,
    pub evidence: String,
    pub tested_at: DateTime<Utc>,
}

/// Final per-target result. At most one per target per run; ordering of the
/// result list follows input order, not completion order.
#[derive(Clone, Debug, Serialize)]
pub struct ScanResult {
    pub target: Target,
    pub credentials: Vec<ConfirmedCredential>,
    pub methods_attempted: Vec<ProbeMethod>,
    pub completed_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn has_findings(&self) -> bool {
        !self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_format() {
        let target = Target {
            scheme: Scheme::Https,
            host: "router.local".to_string(),
            port: 8443,
        };
        assert_eq!(target.fingerprint(), "https://router.local:8443");
    }

    #[test]
    fn test_method_labels() {
        assert_eq!(ProbeMethod::NmapNse.as_str(), "nmap-nse");
        assert_eq!(ProbeMethod::CustomBasic.as_str(), "custom-basic");
    }
}
