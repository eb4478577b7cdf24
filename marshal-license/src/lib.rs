//! License validation core for Marshal.
//!
//! This crate decides whether a deployment's license artifact is valid
//! against the configured trust anchor and produces a diagnostic reason.
//! Three trust models are supported, selected by which anchor file a
//! deployment configures:
//!
//! - a raw issuer public key (licenses signed directly),
//! - a CA certificate (license packages embed a customer certificate),
//! - a separate organization certificate shipped next to the license.
//!
//! # Design Principles
//!
//! - **One pipeline, three stage lists**: the trust models share the same
//!   ordered check machinery instead of three validators.
//! - **Verdicts, not errors**: `validate_license()` always returns a
//!   `(valid, reason)` verdict; "invalid license" is an expected outcome,
//!   not a fault.
//! - **Validation only**: license generation never ships to customer
//!   deployments.

mod anchor;
mod canonical;
mod certificate;
mod error;
mod package;
mod validator;
mod verify;

pub use anchor::{resolve_path, TrustAnchor};
pub use canonical::to_canonical_json;
pub use certificate::LicenseCertificate;
pub use error::{LicenseError, LicenseResult};
pub use package::{LicenseData, LicensePackage, LicenseSummary};
pub use validator::{Validator, Variant, Verdict};
pub use verify::{max_salt_len, verify_pss};
