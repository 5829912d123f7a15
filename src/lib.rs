//! # cloudfloat
//!
//! Keeps a set of Cloudflare A records pointed at the machine's public IPv4
//! address.
//!
//! ## Features
//!
//! - Public IPv4 discovery through any plain-text echo server
//! - Create-or-update of one A record per configured domain
//! - Per-domain TTL and proxied overrides on top of global defaults
//! - Bounded, jittered retries around every network operation
//! - Concurrent domain updates with isolated failures
//!
//! ## Usage
//!
//! ```bash
//! # Print a documented configuration template
//! cloudfloat --dump-config-template > cloudfloat.toml
//!
//! # Update all configured domains once
//! CF_API_TOKEN=... cloudfloat cloudfloat.toml
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod lock;
pub mod logging;
pub mod orchestrator;
pub mod providers;
pub mod reconciler;
pub mod retry;

pub use config::Config;
pub use detector::{IpDetector, ResolvedAddress};
pub use error::{DdnsError, Result};
pub use orchestrator::{ExitStatus, Orchestrator, RunReport};
pub use retry::RetryPolicy;
