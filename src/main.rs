//! cloudfloat - point Cloudflare A records at this machine's public IP.

use anyhow::Context;
use clap::Parser;
use cloudfloat::config::{self, Config};
use cloudfloat::detector::IpDetector;
use cloudfloat::lock::InstanceLock;
use cloudfloat::logging;
use cloudfloat::orchestrator::{ExitStatus, Orchestrator};
use cloudfloat::providers::{CloudflareProvider, Credentials};
use cloudfloat::retry::RetryPolicy;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const CREDENTIALS_HELP: &str = "\
Cloudflare credentials are passed in through environment variables. Set one of:

  - CF_API_TOKEN (must have permission to edit DNS records in the configured zones)
  - CF_API_KEY and CF_API_EMAIL";

#[derive(Parser)]
#[command(name = "cloudfloat")]
#[command(about = "Point Cloudflare A records at this machine's public IPv4 address")]
#[command(after_help = CREDENTIALS_HELP)]
#[command(version)]
struct Cli {
    /// Path to config file
    config: Option<PathBuf>,

    /// Print a documented config file template and exit
    #[arg(long)]
    dump_config_template: bool,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        Config::default_path().ok(),
        Some(PathBuf::from("/etc/cloudfloat/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    Config::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.dump_config_template {
        print!("{}", config::TEMPLATE);
        return ExitCode::SUCCESS;
    }

    let config_path = get_config_path(cli.config);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load and parse config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.logging.logfile.as_deref()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(status) => status.into(),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<ExitStatus> {
    let lock_path = InstanceLock::default_path();
    let _lock = InstanceLock::acquire(&lock_path)?;

    let credentials = Credentials::from_env().context("failed to init Cloudflare API")?;
    let provider = CloudflareProvider::new(credentials).context("failed to init Cloudflare API")?;

    let policy = RetryPolicy::default();
    let detector = IpDetector::new()?;
    let address = policy
        .run("fetching external IP address", || {
            detector.resolve(&config.ip.echo_server)
        })
        .await?;
    tracing::info!("external IP address: {}", address);

    let orchestrator = Orchestrator::new(Arc::new(provider), policy);
    let report = orchestrator
        .run(address, &config.dns.domains, config.defaults())
        .await;

    for outcome in report.failed() {
        tracing::error!(
            "{}: {}",
            outcome.domain,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(report.status())
}
