//! silo - syslog collector
//!
//! Listens for syslog datagrams on a raw IP socket, decodes them, and
//! prints the events to stdout.
//!
//! # Usage
//!
//! ```bash
//! # Run with ./settings.json (created with defaults if absent)
//! silo
//!
//! # Custom settings path, verbose logging
//! silo --settings /etc/silo/settings.json -v
//! ```
//!
//! Raw sockets need CAP_NET_RAW; run as root or grant the capability.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use silo_config::Settings;
use silo_pipeline::{Collector, CollectorConfig, PipelineError, SocketMode};
use silo_sinks::StdoutSink;

/// Silo - syslog collector
#[derive(Parser, Debug)]
#[command(name = "silo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the settings file (created with defaults if absent)
    #[arg(short = 's', long, default_value = "settings.json")]
    settings: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings = Settings::load_or_create(&cli.settings)
        .with_context(|| format!("loading settings from '{}'", cli.settings.display()))?;

    if settings.use_tcp {
        bail!(
            "use_tcp is set in '{}', but the TCP/TLS transport is not provided by this build",
            cli.settings.display()
        );
    }

    let collector = Arc::new(Collector::new(CollectorConfig {
        bind_address: settings.bind_address()?,
        port: settings.udp_port,
        mode: SocketMode::Raw,
        ..Default::default()
    }));
    collector.register_sink(Arc::new(StdoutSink::default()));

    if let Err(e) = collector.start() {
        if let PipelineError::Bind { ref source, .. } = e {
            if source.kind() == ErrorKind::PermissionDenied {
                bail!("{e}: raw sockets need CAP_NET_RAW; run as root or grant the capability");
            }
        }
        return Err(e.into());
    }
    tracing::info!("collector running, Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    collector.stop();
    collector.join().await;

    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
