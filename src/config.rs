//! Configuration management for cloudfloat.

use crate::error::{DdnsError, Result};
use crate::providers::RecordType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Documented configuration template, printed by `--dump-config-template`.
pub const TEMPLATE: &str = r#"[ip]
# 'echo_server' is the URL of a service that echoes back the IP address of the
# querying client. Such a service is necessary when the device is behind a NAT.
# You can self-host or use a third-party service like ifconfig.co. Required, no
# default.
#echo_server = "https://ifconfig.co/"

[dns]
# 'ttl' is the TTL for each DNS record set. Must be a positive integer. The
# special value 1 is "automatic" on Cloudflare. Optional, with a default of 60.
#
# This setting affects all configured domains, and can be overridden
# individually.
#ttl = 60

# 'proxied' determines whether the record is proxied by Cloudflare. Optional,
# with a default of false.
#
# This setting affects all configured domains, and can be overridden
# individually.
#proxied = false

# 'dns.domain' is an array of tables. Every [[dns.domain]] is pointed at your
# external IP.
[[dns.domain]]
# 'zone' is the name of the zone as seen on your Cloudflare dashboard. Required.
#zone = "example.com"

# 'domain' is the fully qualified name to keep updated. Required.
#domain = "ddns.example.com"

# 'ttl' overrides dns.ttl for this domain. Optional.
#ttl = 60

# 'proxied' overrides dns.proxied for this domain. Optional.
#proxied = false

[logging]
# 'logfile' is the path to the log file. If configured, logs are appended to it
# instead of stderr (a coloured copy still goes to stderr when it is a
# terminal). Optional, no default.
#logfile = "/var/log/cloudfloat.log"
"#;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ip: IpConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// IP detection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IpConfig {
    /// URL of a service that echoes back the caller's IP.
    #[serde(default)]
    pub echo_server: String,
}

/// DNS settings shared by all domains.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    #[serde(default)]
    pub proxied: bool,

    #[serde(default, rename = "domain")]
    pub domains: Vec<DomainConfig>,
}

fn default_ttl() -> u32 {
    60
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            proxied: false,
            domains: Vec::new(),
        }
    }
}

/// One `[[dns.domain]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub zone: String,

    #[serde(default)]
    pub domain: String,

    /// Overrides `dns.ttl` when set.
    pub ttl: Option<u32>,

    /// Overrides `dns.proxied` when set.
    pub proxied: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub logfile: Option<PathBuf>,
}

/// Values a domain inherits unless it overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalDefaults {
    pub ttl: u32,
    pub proxied: bool,
}

/// Fully resolved parameters for one managed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTarget {
    pub zone: String,
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub proxied: bool,
}

impl DomainTarget {
    /// Build an A-record target. `name` must be `zone` or lie under it.
    pub fn new(zone: &str, name: &str, ttl: u32, proxied: bool) -> Result<Self> {
        let zone = strip_trailing_dot(zone);
        let name = strip_trailing_dot(name);
        if !is_same_or_subdomain(name, zone) {
            return Err(DdnsError::Config(format!(
                "{} not in zone {}, please use FQDN (trailing dot optional)",
                name, zone
            )));
        }
        Ok(Self {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type: RecordType::A,
            ttl,
            proxied,
        })
    }
}

fn strip_trailing_dot(s: &str) -> &str {
    s.strip_suffix('.').unwrap_or(s)
}

/// Whether `domain` equals `zone` or is a subdomain of it. Trailing dots are
/// ignored.
pub fn in_zone(domain: &str, zone: &str) -> bool {
    is_same_or_subdomain(strip_trailing_dot(domain), strip_trailing_dot(zone))
}

/// Suffix match on already normalized names.
fn is_same_or_subdomain(domain: &str, zone: &str) -> bool {
    if zone.is_empty() {
        return false;
    }
    domain == zone
        || domain
            .strip_suffix(zone)
            .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
}

impl DomainConfig {
    /// Apply overrides on top of `defaults`. An unset override inherits the
    /// default; an explicit `false` or value always wins.
    pub fn resolve(&self, defaults: GlobalDefaults) -> Result<DomainTarget> {
        DomainTarget::new(
            &self.zone,
            &self.domain,
            self.ttl.unwrap_or(defaults.ttl),
            self.proxied.unwrap_or(defaults.proxied),
        )
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("cloudfloat").join("config.toml"))
    }

    /// Load and validate configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DdnsError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn defaults(&self) -> GlobalDefaults {
        GlobalDefaults {
            ttl: self.dns.ttl,
            proxied: self.dns.proxied,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ip.echo_server.is_empty() {
            return Err(DdnsError::Config(
                "ip.echo_server must be configured".to_string(),
            ));
        }
        if self.dns.ttl == 0 {
            return Err(DdnsError::Config(
                "dns.ttl must be a positive integer".to_string(),
            ));
        }
        if self.dns.domains.is_empty() {
            return Err(DdnsError::Config(
                "at least one dns.domain required".to_string(),
            ));
        }

        for (i, d) in self.dns.domains.iter().enumerate() {
            if d.zone.is_empty() {
                return Err(DdnsError::Config(format!(
                    "dns.domain[{}].zone must be configured",
                    i
                )));
            }
            if d.domain.is_empty() {
                return Err(DdnsError::Config(format!(
                    "dns.domain[{}].domain must be configured",
                    i
                )));
            }
            if d.ttl == Some(0) {
                return Err(DdnsError::Config(format!(
                    "dns.domain[{}].ttl must be a positive integer",
                    i
                )));
            }
            if !in_zone(&d.domain, &d.zone) {
                return Err(DdnsError::Config(format!(
                    "{} not in zone {}, please use FQDN (trailing dot optional)",
                    d.domain, d.zone
                )));
            }
        }

        Ok(())
    }
}
