use super::transport::Transport;
use super::Probe;
use crate::catalog::Catalog;
use crate::core::errors::ScanError;
use crate::core::models::{Finding, ProbeMethod, Target};
use crate::evasion::RateGate;
use async_trait::async_trait;
use std::sync::Arc;

const SUCCESS_MARKERS: &[&str] = &["logout", "sign out", "dashboard", "welcome"];
const LOGIN_FORM_MARKER: &str = "type=\"password\"";

/// Built-in Basic-auth prober. Walks the credential catalog in its fixed
/// order, stopping at the first confirmed pair unless asked to enumerate
/// all. Every attempt passes the rate gate first; transport failures move
/// on to the next credential with no retry, so a target costs at most one
/// request per catalog entry.
pub struct CustomProbe {
    catalog: Arc<Catalog>,
    transport: Arc<dyn Transport>,
    gate: Arc<RateGate>,
    enumerate_all: bool,
}

impl std::fmt::Debug for CustomProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomProbe")
            .field("enumerate_all", &self.enumerate_all)
            .finish_non_exhaustive()
    }
}

impl CustomProbe {
    pub fn new(
        catalog: Arc<Catalog>,
        transport: Arc<dyn Transport>,
        gate: Arc<RateGate>,
        enumerate_all: bool,
    ) -> Self {
        Self {
            catalog,
            transport,
            gate,
            enumerate_all,
        }
    }
}

/// Many servers answer 200 for both the login form and the authenticated
/// page, so the status is corroborated with a content check: the body must
/// carry an authenticated-page marker and must not still be asking for a
/// password.
fn is_authenticated(status: u16, body: &str) -> bool {
    if !(200..300).contains(&status) {
        return false;
    }

    let lower = body.to_lowercase();
    if lower.contains(LOGIN_FORM_MARKER) {
        return false;
    }

    SUCCESS_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[async_trait]
impl Probe for CustomProbe {
    fn name(&self) -> &'static str {
        "custom_basic"
    }

    fn method(&self) -> ProbeMethod {
        ProbeMethod::CustomBasic
    }

    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ScanError> {
        let url = target.url();
        let mut findings = Vec::new();

        for cred in self.catalog.credentials() {
            let user_agent = self.gate.admit().await;

            match self
                .transport
                .get_basic_auth(&url, cred, user_agent)
                .await
            {
                Ok(reply) => {
                    if is_authenticated(reply.status, &reply.body) {
                        tracing::info!(
                            "credentials found on {}: {}:{}",
                            target,
                            cred.username,
                            cred.password
                        );
                        findings.push(Finding::success(
                            target,
                            ProbeMethod::CustomBasic,
                            cred,
                            format!("HTTP {} - authenticated content", reply.status),
                        ));
                        if !self.enumerate_all {
                            break;
                        }
                    }
                }
                Err(e) => {
                    // Connection refused, TLS failure, timeout: recoverable,
                    // next credential
                    tracing::debug!(
                        "attempt {}:{} against {} failed: {}",
                        cred.username,
                        cred.password,
                        target,
                        e
                    );
                }
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Credential, Scheme};
    use crate::probes::transport::HttpReply;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTransport {
        /// (username, password) -> (status, body); anything else gets the
        /// default reply
        replies: HashMap<(String, String), (u16, String)>,
        default: (u16, String),
        requests: AtomicUsize,
        fail_first: usize,
    }

    impl FakeTransport {
        fn new(default_status: u16, default_body: &str) -> Self {
            Self {
                replies: HashMap::new(),
                default: (default_status, default_body.to_string()),
                requests: AtomicUsize::new(0),
                fail_first: 0,
            }
        }

        fn with_reply(mut self, user: &str, pass: &str, status: u16, body: &str) -> Self {
            self.replies.insert(
                (user.to_string(), pass.to_string()),
                (status, body.to_string()),
            );
            self
        }

        fn failing_first(mut self, n: usize) -> Self {
            self.fail_first = n;
            self
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_basic_auth(
            &self,
            _url: &str,
            cred: &Credential,
            _user_agent: Option<&str>,
        ) -> Result<HttpReply, ScanError> {
            let n = self.requests.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(ScanError::Transport("connection refused".to_string()));
            }

            let (status, body) = self
                .replies
                .get(&(cred.username.clone(), cred.password.clone()))
                .cloned()
                .unwrap_or_else(|| self.default.clone());
            Ok(HttpReply { status, body })
        }
    }

    fn target() -> Target {
        Target {
            scheme: Scheme::Http,
            host: "10.0.0.1".to_string(),
            port: 80,
        }
    }

    fn probe(transport: Arc<FakeTransport>, all: bool) -> CustomProbe {
        CustomProbe::new(
            Arc::new(Catalog::builtin()),
            transport,
            Arc::new(RateGate::new(false)),
            all,
        )
    }

    #[test]
    fn test_heuristic_requires_content_corroboration() {
        // 200 alone is not enough: a login form also answers 200
        assert!(!is_authenticated(200, "<form>please log in</form>"));
        assert!(!is_authenticated(
            200,
            r#"Welcome! <input type="password" name="pw">"#
        ));
        assert!(!is_authenticated(401, "dashboard"));
        assert!(!is_authenticated(403, "logout"));

        assert!(is_authenticated(200, "<a href=\"/logout\">Logout</a>"));
        assert!(is_authenticated(200, "Admin Dashboard"));
        assert!(is_authenticated(204, "welcome back"));
    }

    #[tokio::test]
    async fn test_admin_admin_scenario() {
        // Catalog entry (admin, admin) authenticates; exactly one finding
        let transport = Arc::new(
            FakeTransport::new(401, "Unauthorized").with_reply(
                "admin",
                "admin",
                200,
                "<html>Dashboard - <a>logout</a></html>",
            ),
        );
        let findings = probe(transport, false).run(&target()).await.unwrap();

        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.method, ProbeMethod::CustomBasic);
        assert_eq!(f.username, "admin");
        assert_eq!(f.password, "admin");
        assert!(f.success);
        assert_eq!(f.fingerprint, "http://10.0.0.1:80");
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_success() {
        // admin:admin is the first catalog entry, so one request suffices
        let transport = Arc::new(
            FakeTransport::new(401, "Unauthorized")
                .with_reply("admin", "admin", 200, "welcome"),
        );
        probe(transport.clone(), false).run(&target()).await.unwrap();
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_enumerate_all_collects_every_success() {
        let transport = Arc::new(
            FakeTransport::new(401, "Unauthorized")
                .with_reply("admin", "admin", 200, "welcome")
                .with_reply("root", "root", 200, "dashboard"),
        );
        let findings = probe(transport.clone(), true).run(&target()).await.unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(transport.request_count(), Catalog::builtin().len());
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_stop_the_walk() {
        // First two attempts get connection refused; a later pair still hits
        let transport = Arc::new(
            FakeTransport::new(401, "Unauthorized")
                .with_reply("root", "root", 200, "welcome")
                .failing_first(2),
        );
        let findings = probe(transport.clone(), false).run(&target()).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].username, "root");
    }

    #[tokio::test]
    async fn test_login_page_everywhere_yields_nothing() {
        let transport = Arc::new(FakeTransport::new(
            200,
            r#"<form><input type="password"></form> welcome"#,
        ));
        let findings = probe(transport.clone(), false).run(&target()).await.unwrap();
        assert!(findings.is_empty());
        // No retries: exactly one attempt per catalog entry
        assert_eq!(transport.request_count(), Catalog::builtin().len());
    }
}
