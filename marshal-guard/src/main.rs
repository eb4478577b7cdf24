//! Marshal guard service.
//!
//! Loads configuration from the environment, constructs the validator
//! (fatal if the trust anchor is unusable), and runs the expiry monitor
//! until interrupted.

use anyhow::{Context, Result};
use marshal_guard::{DeploymentReaper, ExpiryMonitor, GuardConfig, MonitorConfig};
use std::fs::File;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GuardConfig::from_env()?;
    let log_level = if config.debug { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact();
    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let file = File::create(dir.join("marshal-guard.log"))
                .context("cannot open log file")?;
            builder.with_writer(Arc::new(file)).with_ansi(false).init();
        }
        None => builder.init(),
    }

    info!("Marshal guard starting...");

    // No usable trust anchor means no service.
    let validator = config
        .build_validator()
        .context("trust anchor unusable, refusing to start")?;
    info!(variant = ?validator.variant(), license = %validator.license_path().display(), "validator ready");

    let monitor = ExpiryMonitor::new(
        validator,
        DeploymentReaper::new(&config.deployment_path),
        MonitorConfig { interval: config.check_interval, ..MonitorConfig::default() },
    );
    let handle = monitor.spawn();

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt. Shutting down...");
    handle.shutdown().await;
    Ok(())
}
