//! Error types for cloudfloat.

use crate::providers::RecordType;
use thiserror::Error;

/// Result type alias for cloudfloat.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// The echo server answered with something that is not an IP literal.
    #[error("failed to parse echo server response as IP: {excerpt:?}")]
    Format { excerpt: String },

    /// The echo server answered with an address we refuse to publish.
    #[error("not a public IPv4 address: {0}")]
    Validation(String),

    /// Provider-specific error.
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("error querying zone {zone}: {source}")]
    ZoneLookup {
        zone: String,
        #[source]
        source: Box<DdnsError>,
    },

    #[error("error fetching DNS records ({record_type} for {name}): {source}")]
    RecordList {
        record_type: RecordType,
        name: String,
        #[source]
        source: Box<DdnsError>,
    },

    #[error("error creating DNS record ({record_type} for {name}): {source}")]
    RecordCreate {
        record_type: RecordType,
        name: String,
        #[source]
        source: Box<DdnsError>,
    },

    #[error("error updating DNS record ({record_type} for {name}): {source}")]
    RecordUpdate {
        record_type: RecordType,
        name: String,
        #[source]
        source: Box<DdnsError>,
    },

    /// Single-instance lock could not be taken.
    #[error("Lock error: {0}")]
    Lock(String),
}

impl DdnsError {
    /// Whether running the same operation again could plausibly succeed.
    ///
    /// Bad configuration and a held lock are permanent. Everything that comes
    /// back from the network, including an unusable echo answer, may differ
    /// on the next attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DdnsError::Config(_) | DdnsError::Lock(_))
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}
