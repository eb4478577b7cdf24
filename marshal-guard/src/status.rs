//! Query interface consumed by the web layer.
//!
//! Two operations: report the current license status, and replace the
//! license file. Replacement is atomic from the perspective of concurrent
//! validators: the upload is written to a temp file in the same directory,
//! validated with an independent validator, and only renamed over the
//! canonical path when it passes. A reader never observes a half-written or
//! unvalidated file.

use crate::error::GuardResult;
use marshal_license::Validator;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// License status as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub valid: bool,
    pub message: String,
    pub customer_id: Option<String>,
    pub modules: Vec<String>,
    pub issued_on: String,
    pub expiration: String,
}

/// Result of a license upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
}

/// Validates the current license and extracts its display fields.
///
/// An unreadable artifact still produces a report; the display fields fall
/// back to placeholders and the verdict carries the reason.
#[must_use]
pub fn license_status(validator: &Validator) -> StatusReport {
    let verdict = validator.validate_license();
    info!(valid = verdict.valid, "license status requested");

    let (customer_id, modules, issued_on, expiration) = match validator.summary() {
        Ok(summary) => (
            summary.customer_id,
            summary.modules,
            summary.issued_on,
            summary.expiration,
        ),
        Err(e) => {
            warn!(error = %e, "license summary unavailable");
            (None, Vec::new(), "-".to_string(), "-".to_string())
        }
    };

    StatusReport {
        valid: verdict.valid,
        message: verdict.reason,
        customer_id,
        modules,
        issued_on,
        expiration,
    }
}

/// Replaces the license file with uploaded content, validate-then-swap.
///
/// The canonical file is untouched unless the uploaded content validates.
///
/// # Errors
///
/// Returns an error only for I/O faults around the temp file; an invalid
/// upload is a successful call with `success: false`.
pub fn upload_license(validator: &Validator, content: &[u8]) -> GuardResult<UploadOutcome> {
    let canonical = validator.license_path();
    let dir = canonical.parent().unwrap_or_else(|| std::path::Path::new("."));

    // Same directory as the canonical file so the final rename is atomic.
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.flush()?;

    let candidate = validator.with_license_path(temp.path());
    let verdict = candidate.validate_license();
    if !verdict.valid {
        info!(reason = %verdict.reason, "rejected uploaded license");
        // Dropping the temp file deletes it.
        return Ok(UploadOutcome { success: false, message: verdict.reason });
    }

    temp.persist(canonical).map_err(|e| e.error)?;
    info!("license file replaced");
    Ok(UploadOutcome { success: true, message: verdict.reason })
}
