//! License artifact parsing.
//!
//! A license package is a JSON file of the form:
//!
//! ```text
//! { "license": { ...signed fields... },
//!   "signature": "<hex>",
//!   "certificate": "<base64 PEM>" }      // certificate-embedded deployments only
//! ```
//!
//! The `license` object is kept both as a typed view ([`LicenseData`]) and as
//! the raw JSON value. Signing bytes are always reconstructed from the raw
//! value so unknown fields survive the disk round-trip and normalization
//! never changes what gets verified.

use crate::canonical::to_canonical_json;
use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// The signed license payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseData {
    /// Customer / organization identifier.
    pub customer_id: String,
    /// Contact addresses. A bare string in the artifact becomes a
    /// one-element list.
    #[serde(default, deserialize_with = "string_or_list")]
    pub customer_email: Option<Vec<String>>,
    /// Enabled module names.
    #[serde(default)]
    pub modules: Vec<String>,
    /// Issuance date, as written by the issuer.
    #[serde(default)]
    pub issued_on: Option<String>,
    /// Expiration date, format fixed per deployment variant.
    pub expiration: String,
}

/// Summary of a license file for status reporting. Missing fields render
/// as `-` so the caller never has to special-case partial artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseSummary {
    pub customer_id: Option<String>,
    pub modules: Vec<String>,
    pub issued_on: String,
    pub expiration: String,
}

/// A license package loaded from disk, not yet validated.
#[derive(Debug, Clone)]
pub struct LicensePackage {
    /// Typed view of the license object.
    pub data: LicenseData,
    /// Raw license object, the source of signing bytes.
    raw: Value,
    /// Signature bytes (hex-decoded).
    pub signature: Vec<u8>,
    /// Embedded certificate, base64 PEM, still undecoded. Decoding happens
    /// in the certificate-load stage so its failures report as certificate
    /// failures rather than license-load failures.
    pub certificate_b64: Option<String>,
}

#[derive(Deserialize)]
struct RawPackage {
    license: Value,
    signature: String,
    #[serde(default)]
    certificate: Option<String>,
}

impl LicensePackage {
    /// Reads and parses a license package from disk.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, malformed JSON, missing fields, or a
    /// non-hex signature.
    pub fn load(path: &Path) -> LicenseResult<Self> {
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Parses a license package from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> LicenseResult<Self> {
        let raw_package: RawPackage = serde_json::from_slice(bytes)?;
        let data: LicenseData = serde_json::from_value(raw_package.license.clone())?;
        let signature = hex::decode(raw_package.signature.trim())
            .map_err(|e| LicenseError::Signature(format!("signature is not valid hex: {e}")))?;
        Ok(Self {
            data,
            raw: raw_package.license,
            signature,
            certificate_b64: raw_package.certificate,
        })
    }

    /// Returns the canonical signing bytes of the license object.
    #[must_use]
    pub fn signing_bytes(&self) -> Vec<u8> {
        to_canonical_json(&self.raw).into_bytes()
    }

    /// Returns the raw license object.
    #[must_use]
    pub fn raw_license(&self) -> &Value {
        &self.raw
    }

    /// Extracts display fields for status reporting.
    #[must_use]
    pub fn summary(&self) -> LicenseSummary {
        LicenseSummary {
            customer_id: Some(self.data.customer_id.clone()),
            modules: self.data.modules.clone(),
            issued_on: self.data.issued_on.clone().unwrap_or_else(|| "-".to_string()),
            expiration: self.data.expiration.clone(),
        }
    }
}

/// Accepts `"a@b"` or `["a@b", "c@d"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(list) => list,
    }))
}
