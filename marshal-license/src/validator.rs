//! The license validation pipeline.
//!
//! One validator serves three deployment trust models. Each variant runs the
//! same ordered stage machinery with a different stage list:
//!
//! - `PublicKey`: expiry check, then signature against the configured key.
//! - `CaCertificate`: the package embeds a customer certificate; verify it
//!   against the CA, check its window, then expiry, signature with the
//!   embedded key, and the serialNumber identity binding.
//! - `OrgCertificate`: the organization certificate ships separately; check
//!   its window, expiry, a combined-layout signature (falling back to the
//!   legacy license-only layout), and the organizationName identity binding.
//!
//! `validate_license()` never fails with an error: every failure mode
//! becomes an invalid [`Verdict`] with a diagnostic reason.

use crate::anchor::TrustAnchor;
use crate::certificate::LicenseCertificate;
use crate::error::LicenseError;
use crate::package::{LicensePackage, LicenseSummary};
use crate::verify::verify_pss;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{NaiveDate, Utc};
use rsa::RsaPublicKey;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The validation strategy a deployment runs, selected by which trust
/// anchor is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// License signed directly by the issuer key.
    PublicKey,
    /// License package embeds a CA-chained customer certificate.
    CaCertificate,
    /// Organization certificate shipped as a separate file.
    OrgCertificate,
}

impl Variant {
    /// The expiration date format this variant accepts. The divergence is a
    /// per-variant contract; unifying it would change acceptance behavior
    /// for artifacts already in the field.
    #[must_use]
    pub fn date_format(&self) -> &'static str {
        match self {
            Self::PublicKey => "%d-%m-%Y",
            Self::CaCertificate | Self::OrgCertificate => "%Y-%m-%d",
        }
    }

    /// Ordered check stages for this variant.
    fn stages(&self) -> &'static [Stage] {
        match self {
            Self::PublicKey => &[Stage::CheckLicenseExpiry, Stage::VerifySignature],
            Self::CaCertificate => &[
                Stage::LoadCertificate,
                Stage::VerifyCertificateSignature,
                Stage::CheckCertificateWindow,
                Stage::CheckLicenseExpiry,
                Stage::VerifySignature,
                Stage::CheckIdentityBinding,
            ],
            Self::OrgCertificate => &[
                Stage::LoadCertificate,
                Stage::CheckCertificateWindow,
                Stage::CheckLicenseExpiry,
                Stage::VerifySignature,
                Stage::CheckIdentityBinding,
            ],
        }
    }
}

/// A single check in the pipeline. Stages run in order and short-circuit on
/// the first failure.
#[derive(Debug, Clone, Copy)]
enum Stage {
    LoadCertificate,
    VerifyCertificateSignature,
    CheckCertificateWindow,
    CheckLicenseExpiry,
    VerifySignature,
    CheckIdentityBinding,
}

/// The outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the license is valid.
    pub valid: bool,
    /// Human-readable reason, suitable for status reporting.
    pub reason: String,
}

impl Verdict {
    fn pass() -> Self {
        Self { valid: true, reason: "license valid".to_string() }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self { valid: false, reason: reason.into() }
    }
}

/// Validates license artifacts against an immutable trust anchor.
///
/// Stateless per call apart from the anchor, so concurrent validation from
/// multiple tasks needs no locking.
#[derive(Debug, Clone)]
pub struct Validator {
    license_path: PathBuf,
    anchor: TrustAnchor,
    variant: Variant,
}

impl Validator {
    /// Creates a validator over an already-loaded trust anchor. Anchor
    /// loading (the fallible, startup-fatal part) happens in
    /// [`TrustAnchor`]'s constructors.
    #[must_use]
    pub fn new(license_path: impl Into<PathBuf>, anchor: TrustAnchor) -> Self {
        let variant = anchor.variant();
        Self { license_path: license_path.into(), anchor, variant }
    }

    /// Returns the active validation variant.
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Returns the path of the license artifact this validator reads.
    #[must_use]
    pub fn license_path(&self) -> &Path {
        &self.license_path
    }

    /// Returns an independent validator over the same trust anchor but a
    /// different artifact path. Used to vet an uploaded file before it
    /// replaces the canonical one.
    #[must_use]
    pub fn with_license_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            license_path: path.into(),
            anchor: self.anchor.clone(),
            variant: self.variant,
        }
    }

    /// Runs the full validation pipeline.
    ///
    /// Never panics and never returns an error; every failure collapses to
    /// an invalid verdict with a reason.
    #[must_use]
    pub fn validate_license(&self) -> Verdict {
        let package = match LicensePackage::load(&self.license_path) {
            Ok(package) => package,
            Err(e) => return Verdict::fail(format!("failed to load license: {e}")),
        };

        let mut certificate: Option<LicenseCertificate> = None;
        for stage in self.variant.stages() {
            if let Some(verdict) = self.run_stage(*stage, &package, &mut certificate) {
                debug!(stage = ?stage, reason = %verdict.reason, "validation stopped");
                return verdict;
            }
        }
        Verdict::pass()
    }

    /// Extracts display fields from the license artifact without validating.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact cannot be read or parsed.
    pub fn summary(&self) -> crate::LicenseResult<LicenseSummary> {
        Ok(LicensePackage::load(&self.license_path)?.summary())
    }

    /// Runs one stage; `Some(verdict)` stops the pipeline.
    fn run_stage(
        &self,
        stage: Stage,
        package: &LicensePackage,
        certificate: &mut Option<LicenseCertificate>,
    ) -> Option<Verdict> {
        match stage {
            Stage::LoadCertificate => {
                match self.load_certificate(package) {
                    Ok(cert) => {
                        *certificate = Some(cert);
                        None
                    }
                    Err(reason) => Some(Verdict::fail(reason)),
                }
            }
            Stage::VerifyCertificateSignature => {
                let cert = certificate.as_ref()?;
                let TrustAnchor::CaCertificate(ca) = &self.anchor else {
                    return None;
                };
                let ca_key = match ca.public_key() {
                    Ok(key) => key,
                    Err(e) => {
                        return Some(Verdict::fail(format!("certificate validation failed: {e}")))
                    }
                };
                match cert.verify_signed_by(&ca_key) {
                    Ok(()) => None,
                    Err(e) => Some(Verdict::fail(format!("certificate validation failed: {e}"))),
                }
            }
            Stage::CheckCertificateWindow => {
                let cert = certificate.as_ref()?;
                let now = Utc::now();
                if cert.is_valid_at(now) {
                    None
                } else {
                    let (not_before, not_after) = cert.validity_window();
                    Some(Verdict::fail(format!(
                        "certificate expired or not yet valid (valid from {} until {} UTC)",
                        not_before.format("%Y-%m-%d %H:%M:%S"),
                        not_after.format("%Y-%m-%d %H:%M:%S"),
                    )))
                }
            }
            Stage::CheckLicenseExpiry => self.check_expiry(package),
            Stage::VerifySignature => self.verify_signature(package, certificate.as_ref()),
            Stage::CheckIdentityBinding => {
                let cert = certificate.as_ref()?;
                let bound_id = match self.variant {
                    Variant::CaCertificate => cert.serial_number_attribute(),
                    Variant::OrgCertificate => cert.organization_name(),
                    Variant::PublicKey => return None,
                };
                if bound_id.as_deref() == Some(package.data.customer_id.as_str()) {
                    None
                } else {
                    Some(Verdict::fail("organization ID mismatch"))
                }
            }
        }
    }

    /// Obtains the certificate this variant verifies against: embedded in
    /// the package (CA model) or the separately shipped anchor (org model).
    fn load_certificate(&self, package: &LicensePackage) -> Result<LicenseCertificate, String> {
        match &self.anchor {
            TrustAnchor::CaCertificate(_) => {
                let b64 = package
                    .certificate_b64
                    .as_deref()
                    .ok_or("failed to load certificate: package has no embedded certificate")?;
                let compact: String = b64.split_whitespace().collect();
                let pem = BASE64
                    .decode(compact.as_bytes())
                    .map_err(|e| format!("failed to load certificate: invalid base64: {e}"))?;
                LicenseCertificate::from_pem(&pem)
                    .map_err(|e| format!("failed to load certificate: {e}"))
            }
            TrustAnchor::OrgCertificate(cert) => Ok(cert.clone()),
            TrustAnchor::PublicKey(_) => {
                Err("failed to load certificate: no certificate configured".to_string())
            }
        }
    }

    /// Expiry short-circuits before any signature work; an expired license
    /// is the common case and needs no cryptography to reject.
    fn check_expiry(&self, package: &LicensePackage) -> Option<Verdict> {
        let format = self.variant.date_format();
        let expiration = match NaiveDate::parse_from_str(&package.data.expiration, format) {
            Ok(date) => date.and_time(chrono::NaiveTime::MIN),
            Err(_) => {
                let e = LicenseError::DateFormat {
                    value: package.data.expiration.clone(),
                    format,
                };
                return Some(Verdict::fail(format!("failed to load license: {e}")));
            }
        };
        if expiration < Utc::now().naive_utc() {
            Some(Verdict::fail("license expired"))
        } else {
            None
        }
    }

    fn verify_signature(
        &self,
        package: &LicensePackage,
        certificate: Option<&LicenseCertificate>,
    ) -> Option<Verdict> {
        let key: RsaPublicKey = match &self.anchor {
            TrustAnchor::PublicKey(key) => key.clone(),
            TrustAnchor::CaCertificate(_) | TrustAnchor::OrgCertificate(_) => {
                match certificate?.public_key() {
                    Ok(key) => key,
                    Err(e) => {
                        return Some(Verdict::fail(format!(
                            "signature verification failed: {e}"
                        )))
                    }
                }
            }
        };

        let license_bytes = package.signing_bytes();
        let mut last_error = None;
        for input in self.signing_inputs(&license_bytes, certificate) {
            match verify_pss(&key, &input, &package.signature) {
                Ok(()) => return None,
                Err(e) => {
                    debug!(error = %e, "signature attempt failed");
                    last_error = Some(e);
                }
            }
        }
        let cause = last_error.map_or_else(String::new, |e| e.to_string());
        Some(Verdict::fail(format!("signature verification failed: {cause}")))
    }

    /// Candidate signing inputs, most-preferred first. The org-certificate
    /// variant tries the combined certificate+license layout, then falls
    /// back to the legacy license-only layout.
    fn signing_inputs(
        &self,
        license_bytes: &[u8],
        certificate: Option<&LicenseCertificate>,
    ) -> Vec<Vec<u8>> {
        match (self.variant, certificate) {
            (Variant::OrgCertificate, Some(cert)) => {
                let mut combined =
                    Vec::with_capacity(cert.pem_bytes().len() + license_bytes.len());
                combined.extend_from_slice(cert.pem_bytes());
                combined.extend_from_slice(license_bytes);
                vec![combined, license_bytes.to_vec()]
            }
            _ => vec![license_bytes.to_vec()],
        }
    }
}
