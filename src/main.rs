//! txbench - EVM transaction load generator
//!
//! Entry point: loads configuration, applies CLI overrides, connects to the
//! endpoint and runs one benchmark in live or offline mode.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use txbench::metrics::metrics;
use txbench::rpc_manager::{ChainClient, RpcChainClient};
use txbench::{BenchmarkDriver, Config, Mode, RunContext, Workload};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Operating mode (live or offline); overrides the config file
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Workload (token or swap); overrides the config file
    #[arg(short, long)]
    workload: Option<Workload>,

    /// Root directory for offline bundle files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    apply_args(&mut config, &args);

    init_logging(args.verbose, config.monitoring.json_logs)?;

    info!("🚀 Starting txbench");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    config.validate().context("Invalid configuration")?;
    info!(
        "🎯 Mode: {} | Workload: {} | Tokens: {} | Participants: {}",
        config.workload.mode,
        config.workload.kind,
        config.contracts.tokens.len(),
        config.participant_count()
    );

    info!("🌐 Connecting to {}", config.network.rpc_url);
    let client: Arc<dyn ChainClient> = Arc::new(
        RpcChainClient::connect(
            &config.network.rpc_url,
            Duration::from_millis(config.network.receipt_poll_ms),
            Duration::from_secs(config.network.receipt_timeout_secs),
        )
        .context("Failed to create RPC client")?,
    );

    let ctx = RunContext::from_config(&config, client)?;
    let driver = BenchmarkDriver::new(ctx)?;
    let stats = driver.run().await?;

    if config.workload.mode == Mode::Offline {
        info!(
            "📦 Wrote {} bundle entries under {}",
            stats.bundle_entries,
            config.workload.output_dir.display()
        );
    } else {
        info!(
            "✅ Dispatched {} operations in {} flushes ({} ok, {} failed)",
            stats.dispatched, stats.flushes, stats.succeeded, stats.failed
        );
    }

    info!("Run stats: {}", serde_json::to_string(&stats)?);

    if let Some(path) = &config.monitoring.metrics_path {
        write_metrics(path)?;
    }

    info!("👋 Done");
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "txbench=debug,info"
    } else {
        "txbench=info,warn,error"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        // Logging is not up yet
        eprintln!("Config file '{}' not found, using defaults", path);
        let mut config = Config::default();
        dotenvy::dotenv().ok();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }
}

/// CLI flags win over file and environment
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(mode) = args.mode {
        config.workload.mode = mode;
    }
    if let Some(workload) = args.workload {
        config.workload.kind = workload;
    }
    if let Some(dir) = &args.output_dir {
        config.workload.output_dir = dir.clone();
    }
    if args.json_logs {
        config.monitoring.json_logs = true;
    }
}

fn write_metrics(path: &Path) -> Result<()> {
    let rendered = metrics().render()?;
    match std::fs::write(path, rendered) {
        Ok(()) => info!("📊 Metrics written to {}", path.display()),
        Err(e) => warn!("Failed to write metrics to {}: {}", path.display(), e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "txbench",
            "--mode",
            "offline",
            "--workload",
            "swap",
            "--output-dir",
            "/tmp/bundles",
        ]);
        let mut config = Config::default();
        apply_args(&mut config, &args);
        assert_eq!(config.workload.mode, Mode::Offline);
        assert_eq!(config.workload.kind, Workload::Swap);
        assert_eq!(config.workload.output_dir, PathBuf::from("/tmp/bundles"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.workload.mode, Mode::Live);
        assert_eq!(config.live.flush_threshold, 100);
    }
}
