//! Cloudflare DNS provider (API v4).

use super::{DnsProvider, DnsRecord, RecordSpec, RecordType};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare API credentials.
#[derive(Clone)]
pub enum Credentials {
    /// Scoped API token (`CF_API_TOKEN`).
    Token(String),
    /// Global API key plus account email (`CF_API_KEY`, `CF_API_EMAIL`).
    Key { key: String, email: String },
}

// Never print secrets.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::Key { email, .. } => f
                .debug_struct("Key")
                .field("key", &"<redacted>")
                .field("email", email)
                .finish(),
        }
    }
}

impl Credentials {
    /// Read credentials from the environment. A token takes precedence.
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            std::env::var("CF_API_TOKEN").ok(),
            std::env::var("CF_API_KEY").ok(),
            std::env::var("CF_API_EMAIL").ok(),
        )
    }

    fn from_values(
        token: Option<String>,
        key: Option<String>,
        email: Option<String>,
    ) -> Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        if let Some(token) = non_empty(token) {
            return Ok(Credentials::Token(token));
        }
        let key = non_empty(key).ok_or_else(|| {
            DdnsError::Config("No CF_API_KEY or CF_API_TOKEN environment set".to_string())
        })?;
        let email = non_empty(email)
            .ok_or_else(|| DdnsError::Config("No CF_API_EMAIL environment set".to_string()))?;

        Ok(Credentials::Key { key, email })
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credentials::Token(token) => request.bearer_auth(token),
            Credentials::Key { key, email } => request
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
        }
    }
}

/// Cloudflare DNS provider.
#[derive(Debug)]
pub struct CloudflareProvider {
    client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CloudflareError>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(credentials: Credentials, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/client/v4{}", self.base_url, path)
    }

    fn error(&self, message: impl Into<String>) -> DdnsError {
        DdnsError::Provider {
            provider: self.name().to_string(),
            message: message.into(),
        }
    }

    /// Send a request and unwrap the Cloudflare response envelope.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.credentials.apply(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: CloudflareResponse<T> = serde_json::from_str(&body)
            .map_err(|e| self.error(format!("unexpected response (HTTP {}): {}", status, e)))?;

        if !envelope.success {
            let msg = if envelope.errors.is_empty() {
                format!("request failed with HTTP {}", status)
            } else {
                envelope
                    .errors
                    .iter()
                    .map(|e| format!("{} (code {})", e.message, e.code))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            return Err(self.error(msg));
        }

        envelope
            .result
            .ok_or_else(|| self.error("response did not contain a result"))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        let request = self
            .client
            .get(self.url("/zones"))
            .query(&[("name", zone_name)]);

        let zones: Vec<Zone> = self.send(request).await?;

        zones
            .into_iter()
            .next()
            .map(|z| z.id)
            .ok_or_else(|| self.error(format!("zone {} not found", zone_name)))
    }

    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records", zone_id)))
            .query(&[("name", name), ("type", record_type.as_str())]);

        self.send(request).await
    }

    async fn create_record(&self, zone_id: &str, record: &RecordSpec) -> Result<DnsRecord> {
        let request = self
            .client
            .post(self.url(&format!("/zones/{}/dns_records", zone_id)))
            .json(record);

        self.send(request).await
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<DnsRecord> {
        let request = self
            .client
            .patch(self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id)))
            .json(record);

        self.send(request).await
    }
}
