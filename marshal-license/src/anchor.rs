//! Trust anchor loading.
//!
//! The trust anchor is loaded once at validator construction and never
//! mutated. Which kind of anchor a deployment configures selects the
//! validation variant: a raw RSA public key, a CA certificate for
//! certificate-embedded licenses, or the organization's own certificate
//! shipped alongside the license.

use crate::certificate::LicenseCertificate;
use crate::error::{LicenseError, LicenseResult};
use crate::validator::Variant;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// The key or certificate a deployment trusts.
#[derive(Debug, Clone)]
pub enum TrustAnchor {
    /// Long-lived issuer public key; licenses are signed by it directly.
    PublicKey(RsaPublicKey),
    /// CA certificate; the license package embeds a customer certificate
    /// chained to it.
    CaCertificate(LicenseCertificate),
    /// Organization certificate shipped as its own file next to the license.
    OrgCertificate(LicenseCertificate),
}

impl TrustAnchor {
    /// Loads an RSA public key PEM file.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`]; a missing or unparsable anchor is a
    /// startup-fatal condition.
    pub fn public_key_from_file(path: &Path) -> LicenseResult<Self> {
        let pem = read_anchor_file(path)?;
        let key = RsaPublicKey::from_public_key_pem(&pem).map_err(|e| {
            LicenseError::Config(format!("unparsable public key {}: {e}", path.display()))
        })?;
        Ok(Self::PublicKey(key))
    }

    /// Loads a CA certificate PEM file.
    pub fn ca_certificate_from_file(path: &Path) -> LicenseResult<Self> {
        Ok(Self::CaCertificate(read_certificate(path)?))
    }

    /// Loads an organization certificate PEM file.
    pub fn org_certificate_from_file(path: &Path) -> LicenseResult<Self> {
        Ok(Self::OrgCertificate(read_certificate(path)?))
    }

    /// Returns the validation variant this anchor selects.
    #[must_use]
    pub fn variant(&self) -> Variant {
        match self {
            Self::PublicKey(_) => Variant::PublicKey,
            Self::CaCertificate(_) => Variant::CaCertificate,
            Self::OrgCertificate(_) => Variant::OrgCertificate,
        }
    }
}

/// Resolves an artifact path: explicit argument, then environment variable,
/// then the hard-coded default.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>, env_var: &str, default: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(value) = env::var(env_var) {
        let value = value.trim();
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }
    PathBuf::from(default)
}

fn read_anchor_file(path: &Path) -> LicenseResult<String> {
    fs::read_to_string(path).map_err(|e| {
        LicenseError::Config(format!("cannot read trust anchor {}: {e}", path.display()))
    })
}

fn read_certificate(path: &Path) -> LicenseResult<LicenseCertificate> {
    let pem = read_anchor_file(path)?;
    LicenseCertificate::from_pem(pem.as_bytes()).map_err(|e| {
        LicenseError::Config(format!("unparsable certificate {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_anchor_is_config_error() {
        let result = TrustAnchor::public_key_from_file(Path::new("/nonexistent/key.pem"));
        assert!(matches!(result, Err(LicenseError::Config(_))));
    }

    #[test]
    fn explicit_path_wins() {
        let resolved = resolve_path(
            Some(Path::new("/tmp/explicit.pem")),
            "MARSHAL_TEST_UNSET_VAR",
            "./default.pem",
        );
        assert_eq!(resolved, PathBuf::from("/tmp/explicit.pem"));
    }

    #[test]
    fn default_used_when_nothing_set() {
        let resolved = resolve_path(None, "MARSHAL_TEST_UNSET_VAR", "./default.pem");
        assert_eq!(resolved, PathBuf::from("./default.pem"));
    }
}
