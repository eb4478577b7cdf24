//! X.509 certificate handling for certificate-based trust models.
//!
//! Customer certificates carry the organization name (2.5.4.10) and the
//! organization identifier in the subject serialNumber attribute (2.5.4.5),
//! an RSA public key, and a validity window. CA-issued certificates are
//! signed with sha256WithRSAEncryption.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use x509_cert::der::asn1::ObjectIdentifier;
use x509_cert::der::{DecodePem, Encode, Tag, Tagged};
use x509_cert::Certificate;

/// subject organizationName (O=).
const OID_ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
/// subject serialNumber attribute (not the certificate serial).
const OID_SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");
/// sha256WithRSAEncryption, the only issuance algorithm in use.
const OID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// A parsed certificate plus the PEM bytes it came from.
///
/// The original PEM bytes are retained because the combined-layout signature
/// covers them verbatim.
#[derive(Debug, Clone)]
pub struct LicenseCertificate {
    cert: Certificate,
    pem: Vec<u8>,
}

impl LicenseCertificate {
    /// Parses a certificate from PEM bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::CertificateDecode`] when the bytes are not a
    /// valid PEM-encoded certificate.
    pub fn from_pem(pem: &[u8]) -> LicenseResult<Self> {
        let cert = Certificate::from_pem(pem)
            .map_err(|e| LicenseError::CertificateDecode(e.to_string()))?;
        Ok(Self { cert, pem: pem.to_vec() })
    }

    /// Returns the PEM bytes the certificate was parsed from.
    #[must_use]
    pub fn pem_bytes(&self) -> &[u8] {
        &self.pem
    }

    /// Returns the validity window as UTC timestamps.
    #[must_use]
    pub fn validity_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let validity = &self.cert.tbs_certificate.validity;
        (
            DateTime::<Utc>::from(validity.not_before.to_system_time()),
            DateTime::<Utc>::from(validity.not_after.to_system_time()),
        )
    }

    /// Returns true if `now` falls inside the validity window.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let (not_before, not_after) = self.validity_window();
        now >= not_before && now <= not_after
    }

    /// Returns the subject organizationName, if present.
    #[must_use]
    pub fn organization_name(&self) -> Option<String> {
        self.subject_attribute(&OID_ORGANIZATION_NAME)
    }

    /// Returns the subject serialNumber attribute, if present.
    #[must_use]
    pub fn serial_number_attribute(&self) -> Option<String> {
        self.subject_attribute(&OID_SERIAL_NUMBER)
    }

    /// Extracts the RSA public key from the certificate.
    ///
    /// # Errors
    ///
    /// Fails when the subject key is not RSA.
    pub fn public_key(&self) -> LicenseResult<RsaPublicKey> {
        let spki_der = self
            .cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| LicenseError::CertificateDecode(e.to_string()))?;
        RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| LicenseError::Certificate(format!("subject key is not RSA: {e}")))
    }

    /// Verifies this certificate's signature against the issuing CA's key,
    /// using the algorithm the certificate declares.
    ///
    /// # Errors
    ///
    /// Fails on an undeclared/unsupported algorithm or a bad signature.
    pub fn verify_signed_by(&self, ca_key: &RsaPublicKey) -> LicenseResult<()> {
        let algorithm = &self.cert.signature_algorithm.oid;
        if *algorithm != OID_SHA256_WITH_RSA {
            return Err(LicenseError::Certificate(format!(
                "unsupported signature algorithm {algorithm}"
            )));
        }
        let tbs = self
            .cert
            .tbs_certificate
            .to_der()
            .map_err(|e| LicenseError::CertificateDecode(e.to_string()))?;
        let digest = Sha256::digest(&tbs);
        let signature = self.cert.signature.raw_bytes();
        ca_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|e| LicenseError::Certificate(format!("CA signature check failed: {e}")))
    }

    /// Looks up a subject attribute by OID, decoding string value types.
    fn subject_attribute(&self, oid: &ObjectIdentifier) -> Option<String> {
        for rdn in &self.cert.tbs_certificate.subject.0 {
            for atv in rdn.0.iter() {
                if atv.oid == *oid {
                    return match atv.value.tag() {
                        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
                            Some(String::from_utf8_lossy(atv.value.value()).into_owned())
                        }
                        _ => None,
                    };
                }
            }
        }
        None
    }
}
