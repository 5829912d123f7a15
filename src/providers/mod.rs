//! DNS provider capability and implementations.

mod cloudflare;
#[cfg(test)]
pub(crate) mod memory;

pub use cloudflare::{CloudflareProvider, Credentials};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record types this crate manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record.
    A,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as it exists at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

/// Desired attributes of a record, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSpec {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

/// Pre-authenticated access to a DNS provider.
///
/// Implementations must be safe to share between concurrently running
/// reconciliation tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Resolve a zone name to the provider's zone identifier.
    async fn zone_id(&self, zone_name: &str) -> Result<String>;

    /// List records in a zone that match `name` and `record_type` exactly.
    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>>;

    /// Create a new record.
    async fn create_record(&self, zone_id: &str, record: &RecordSpec) -> Result<DnsRecord>;

    /// Overwrite an existing record.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<DnsRecord>;
}
