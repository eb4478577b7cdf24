//! Deployment cleanup after sustained license expiry.
//!
//! The reaper archives the primary data store and then removes everything
//! directly under the deployment root except the licensing component
//! itself, so license checking survives its own enforcement action.
//! Cleanup is best-effort, not transactional: every I/O failure is logged
//! and swallowed, and a partial sweep is an accepted outcome.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory that must survive the sweep: the licensing component.
pub const KEEP_DIR: &str = "marshal";
/// Backup directory created under the deployment root.
pub const BACKUP_DIR: &str = "backup";
/// Primary data store file, archived before the sweep.
pub const PRIMARY_STORE: &str = "data.db";
/// Marker recording which expiry episode has already been cleaned up.
pub const REAP_MARKER: &str = ".marshal-reaped";

/// Cleans up a deployment root after the grace period runs out.
#[derive(Debug, Clone)]
pub struct DeploymentReaper {
    root: PathBuf,
}

impl DeploymentReaper {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the deployment root this reaper operates on.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if this expiry episode has already been reaped.
    ///
    /// The marker stores the expiration date of the license that triggered
    /// cleanup; a renewed license carries a different expiration and
    /// re-arms the guard.
    #[must_use]
    pub fn already_reaped_for(&self, expiration: &str) -> bool {
        match fs::read_to_string(self.root.join(REAP_MARKER)) {
            Ok(marker) => marker.trim() == expiration,
            Err(_) => false,
        }
    }

    /// Archives the data store, sweeps the deployment root, and records the
    /// episode marker. Never fails; partial cleanup is logged and accepted.
    pub fn reap(&self, expiration: &str) {
        info!(root = %self.root.display(), "starting deployment cleanup");
        self.backup_primary_store();
        self.sweep();
        if let Err(e) = fs::write(self.root.join(REAP_MARKER), expiration) {
            warn!(error = %e, "could not record cleanup marker");
        }
        info!("deployment cleanup completed");
    }

    /// Copies the primary store into the backup directory with a
    /// timestamped name. Copy, not move: the original stays in place until
    /// the sweep so an interrupted backup loses nothing.
    fn backup_primary_store(&self) {
        let store = self.root.join(PRIMARY_STORE);
        if !store.exists() {
            return;
        }
        let backup_dir = self.root.join(BACKUP_DIR);
        if let Err(e) = fs::create_dir_all(&backup_dir) {
            warn!(error = %e, "could not create backup directory");
            return;
        }
        let stamped = format!("data_backup_{}.db", Utc::now().format("%Y%m%d_%H%M%S"));
        match fs::copy(&store, backup_dir.join(&stamped)) {
            Ok(_) => info!(backup = %stamped, "data store archived"),
            Err(e) => warn!(error = %e, "data store backup failed"),
        }
    }

    /// Removes every entry directly under the root except the licensing
    /// component, the backup directory, and the episode marker.
    fn sweep(&self) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "cannot list deployment root");
                return;
            }
        };
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name();
            if name == KEEP_DIR || name == BACKUP_DIR || name == REAP_MARKER {
                continue;
            }
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "cleanup failed for entry");
            }
        }
    }
}
