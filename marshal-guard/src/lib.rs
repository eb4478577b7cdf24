//! Deployment gating for Marshal.
//!
//! This crate wraps the validation core with everything a customer
//! deployment runs:
//!
//! - environment-driven configuration and trust-anchor selection,
//! - the query interface the web layer consumes (status + atomic upload),
//! - a background expiry monitor,
//! - the deployment reaper that archives and cleans up after the grace
//!   period.
//!
//! The HTTP layer itself lives elsewhere; it calls [`license_status`] and
//! [`upload_license`] and maps them onto responses.

mod config;
mod error;
mod monitor;
mod reaper;
mod status;

pub use config::GuardConfig;
pub use error::{GuardError, GuardResult};
pub use monitor::{ExpiryMonitor, MonitorConfig, MonitorHandle, GRACE_DAYS};
pub use reaper::{DeploymentReaper, BACKUP_DIR, KEEP_DIR, PRIMARY_STORE, REAP_MARKER};
pub use status::{license_status, upload_license, StatusReport, UploadOutcome};
