//! Status reporting and atomic license upload.

mod common;

use common::{license_value, signed_package, validator_in};
use marshal_guard::{license_status, upload_license};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// ── Status ───────────────────────────────────────────────────────

#[test]
fn status_reports_valid_license_fields() {
    let dir = TempDir::new().unwrap();
    let package = signed_package(&license_value("C1", "01-01-2030"));
    let validator = validator_in(dir.path(), &package);

    let report = license_status(&validator);
    assert!(report.valid, "{}", report.message);
    assert_eq!(report.message, "license valid");
    assert_eq!(report.customer_id.as_deref(), Some("C1"));
    assert_eq!(report.modules, vec!["counting"]);
    assert_eq!(report.issued_on, "01-01-2025");
    assert_eq!(report.expiration, "01-01-2030");
}

#[test]
fn status_for_expired_license_keeps_fields() {
    let dir = TempDir::new().unwrap();
    let package = signed_package(&license_value("C1", "01-01-2020"));
    let validator = validator_in(dir.path(), &package);

    let report = license_status(&validator);
    assert!(!report.valid);
    assert_eq!(report.message, "license expired");
    assert_eq!(report.expiration, "01-01-2020");
}

#[test]
fn status_with_unreadable_artifact_uses_placeholders() {
    let dir = TempDir::new().unwrap();
    let validator = validator_in(dir.path(), "not json at all");

    let report = license_status(&validator);
    assert!(!report.valid);
    assert!(report.message.starts_with("failed to load license"), "{}", report.message);
    assert_eq!(report.issued_on, "-");
    assert_eq!(report.expiration, "-");
    assert!(report.modules.is_empty());
}

// ── Upload ───────────────────────────────────────────────────────

#[test]
fn valid_upload_replaces_canonical_file() {
    let dir = TempDir::new().unwrap();
    let original = signed_package(&license_value("C1", "01-01-2030"));
    let validator = validator_in(dir.path(), &original);

    let renewal = signed_package(&license_value("C1", "01-01-2035"));
    let outcome = upload_license(&validator, renewal.as_bytes()).unwrap();
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.message, "license valid");

    let report = license_status(&validator);
    assert_eq!(report.expiration, "01-01-2035");
}

#[test]
fn invalid_upload_leaves_canonical_file_untouched() {
    let dir = TempDir::new().unwrap();
    let original = signed_package(&license_value("C1", "01-01-2030"));
    let validator = validator_in(dir.path(), &original);

    let outcome = upload_license(&validator, b"{ truncated garbag").unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("failed to load license"), "{}", outcome.message);

    // A concurrent reader of the canonical path sees only the old content.
    let on_disk = std::fs::read_to_string(validator.license_path()).unwrap();
    assert_eq!(on_disk, original);
    assert!(license_status(&validator).valid);
}

#[test]
fn expired_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let original = signed_package(&license_value("C1", "01-01-2030"));
    let validator = validator_in(dir.path(), &original);

    let expired = signed_package(&license_value("C1", "01-01-2020"));
    let outcome = upload_license(&validator, expired.as_bytes()).unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "license expired");
    assert_eq!(license_status(&validator).expiration, "01-01-2030");
}

#[test]
fn rejected_upload_leaves_no_stray_temp_files() {
    let dir = TempDir::new().unwrap();
    let original = signed_package(&license_value("C1", "01-01-2030"));
    let validator = validator_in(dir.path(), &original);

    upload_license(&validator, b"garbage").unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["license.lic", "marshal_public.pem"], "{names:?}");
}
