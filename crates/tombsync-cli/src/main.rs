//! Tombsync - delete replication relay
//!
//! Listens for object-removal webhooks from a source object store and
//! replays each delete on every configured remote site.

use anyhow::Context;
use clap::{builder::BoolishValueParser, ArgAction, Parser, ValueEnum};
use tombsync_core::config::RelayConfig;
use tombsync_relay::RelayServer;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tombsync")]
#[command(author = "Tombsync Team")]
#[command(version = tombsync_core::VERSION)]
#[command(about = "Replicate object deletions to remote S3-compatible sites", long_about = None)]
struct Cli {
    /// Configuration file path; remote sites are read from the environment
    /// (REMOTE_ENDPOINT_<NAME>, ...) when omitted
    #[arg(short, long, env = "TOMBSYNC_CONFIG")]
    config: Option<String>,

    /// Bind to a specific ADDRESS:PORT, ADDRESS can be an IP or hostname
    #[arg(long, env = "TOMBSYNC_ADDRESS")]
    address: Option<String>,

    /// Disable TLS verification for all the remote sites
    #[arg(long, env = "TOMBSYNC_INSECURE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    insecure: bool,

    /// Log deletions without executing them
    #[arg(long, env = "TOMBSYNC_DRY_RUN", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TOMBSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, env = "TOMBSYNC_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    /// Load the base configuration and apply command-line overrides
    fn into_config(self) -> anyhow::Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_file(path)?,
            None => RelayConfig::from_env(),
        };

        if let Some(address) = self.address {
            config.server.address = address;
        }
        if self.insecure {
            config.replication.insecure = true;
        }
        if self.dry_run {
            config.replication.dry_run = true;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = match format {
                LogFormat::Pretty => "pretty",
                LogFormat::Json => "json",
            }
            .to_string();
        }

        Ok(config)
    }
}

fn init_logging(config: &RelayConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = Cli::parse().into_config()?;
    init_logging(&config);

    info!(
        version = tombsync_core::VERSION,
        targets = config.targets.len(),
        dry_run = config.replication.dry_run,
        "Starting tombsync relay"
    );

    if let Err(e) = RelayServer::new(config).run().await {
        error!(code = e.code(), startup = e.is_startup(), "{}", e);
        return Err(e).context("relay terminated");
    }

    Ok(())
}
