//! Periodic license checking.
//!
//! One background task re-validates the license on a fixed interval,
//! decoupled from request-serving tasks. When the license has been expired
//! for at least the grace period, the reaper runs — once per expiry
//! episode, guarded by the reaper's marker file.

use crate::reaper::DeploymentReaper;
use chrono::{NaiveDate, Utc};
use marshal_license::Validator;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Days past expiry before the deployment is reaped.
pub const GRACE_DAYS: i64 = 7;

/// Monitor scheduling parameters.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between checks.
    pub interval: Duration,
    /// Days past expiry before cleanup triggers.
    pub grace_days: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(3600), grace_days: GRACE_DAYS }
    }
}

/// The background expiry monitor.
pub struct ExpiryMonitor {
    validator: Validator,
    reaper: DeploymentReaper,
    config: MonitorConfig,
}

/// Handle for a running monitor task.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals the monitor to stop and waits for it to finish. Returns
    /// promptly even mid-sleep; the wait is interruptible.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "monitor task did not shut down cleanly");
        }
        info!("license monitor stopped");
    }
}

impl ExpiryMonitor {
    #[must_use]
    pub fn new(validator: Validator, reaper: DeploymentReaper, config: MonitorConfig) -> Self {
        Self { validator, reaper, config }
    }

    /// Spawns the monitoring loop on the current runtime.
    #[must_use]
    pub fn spawn(self) -> MonitorHandle {
        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                self.check_once();
                tokio::select! {
                    _ = tokio::time::sleep(self.config.interval) => {}
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        MonitorHandle { shutdown: tx, task }
    }

    /// Runs a single check: validate, and escalate on sustained expiry.
    /// Each check is independent; I/O errors are reported, never retried
    /// within a check.
    pub fn check_once(&self) {
        let verdict = self.validator.validate_license();
        info!(valid = verdict.valid, reason = %verdict.reason, "license status");
        if !verdict.valid {
            self.handle_invalid();
        }
    }

    /// Loads the raw expiration and reaps when the grace period has run out.
    fn handle_invalid(&self) {
        let summary = match self.validator.summary() {
            Ok(summary) => summary,
            Err(e) => {
                // Unreadable artifact: invalid, but there is no expiry date
                // to measure a grace period from.
                warn!(error = %e, "cannot read license for grace-period check");
                return;
            }
        };

        let format = self.validator.variant().date_format();
        let expiration = match NaiveDate::parse_from_str(&summary.expiration, format) {
            Ok(date) => date,
            Err(_) => {
                warn!(expiration = %summary.expiration, "unparsable expiration date");
                return;
            }
        };

        let days_past = (Utc::now().date_naive() - expiration).num_days();
        if days_past < self.config.grace_days {
            debug!(days_past, grace = self.config.grace_days, "inside grace period");
            return;
        }

        if self.reaper.already_reaped_for(&summary.expiration) {
            debug!("expiry episode already cleaned up");
            return;
        }
        warn!(days_past, "grace period exceeded, reaping deployment");
        self.reaper.reap(&summary.expiration);
    }
}
