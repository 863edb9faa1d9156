use crate::core::errors::ScanError;
use crate::core::models::Credential;
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// The one HTTP capability the custom prober needs: send an authenticated
/// GET and hand back status plus body. Tests inject a fake implementation so
/// probe and dispatcher logic never touch the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_basic_auth(
        &self,
        url: &str,
        cred: &Credential,
        user_agent: Option<&str>,
    ) -> Result<HttpReply, ScanError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            // Scan targets routinely present self-signed certs
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_basic_auth(
        &self,
        url: &str,
        cred: &Credential,
        user_agent: Option<&str>,
    ) -> Result<HttpReply, ScanError> {
        let mut request = self
            .client
            .get(url)
            .basic_auth(&cred.username, Some(&cred.password));

        if let Some(ua) = user_agent {
            request = request.header(reqwest::header::USER_AGENT, ua);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(HttpReply { status, body })
    }
}
