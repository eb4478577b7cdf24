//! Shared fixtures for license validation tests.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use marshal_license::{max_salt_len, to_canonical_json};
use rsa::pkcs1v15::SigningKey as CertSigningKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::der::asn1::{ObjectIdentifier, SetOfVec, Utf8StringRef};
use x509_cert::der::{Any, Decode, EncodePem};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::{Time, Validity};

const DAY: u64 = 24 * 60 * 60;

/// RSA key generation is slow; fixture keys are generated once per process.
fn fixture_keys() -> &'static Vec<RsaPrivateKey> {
    static KEYS: OnceLock<Vec<RsaPrivateKey>> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        (0..4)
            .map(|_| RsaPrivateKey::new(&mut rng, 2048).expect("rsa keygen"))
            .collect()
    })
}

/// The key licenses are legitimately signed with.
pub fn issuer_key() -> &'static RsaPrivateKey {
    &fixture_keys()[0]
}

/// A key that should never verify anything.
pub fn wrong_key() -> &'static RsaPrivateKey {
    &fixture_keys()[1]
}

/// CA key for certificate-embedded fixtures.
pub fn ca_key() -> &'static RsaPrivateKey {
    &fixture_keys()[2]
}

/// Customer / organization key for certificate fixtures.
pub fn customer_key() -> &'static RsaPrivateKey {
    &fixture_keys()[3]
}

/// Signs bytes with PSS at maximum salt length, as the issuer does.
pub fn sign_bytes(key: &RsaPrivateKey, message: &[u8]) -> Vec<u8> {
    let digest = Sha256::digest(message);
    let scheme = Pss::new_with_salt::<Sha256>(max_salt_len(key.size()));
    key.sign_with_rng(&mut rand::thread_rng(), scheme, &digest)
        .expect("pss sign")
}

/// Signs the canonical form of a license object.
pub fn sign_license(key: &RsaPrivateKey, license: &Value) -> Vec<u8> {
    sign_bytes(key, to_canonical_json(license).as_bytes())
}

/// Standard test license payload.
pub fn license_value(customer_id: &str, expiration: &str) -> Value {
    json!({
        "customer_id": customer_id,
        "customer_email": ["ops@example.com"],
        "modules": ["counting"],
        "issued_on": "01-01-2025",
        "expiration": expiration,
    })
}

/// Serializes a license package file.
pub fn package_json(license: &Value, signature: &[u8], certificate_b64: Option<&str>) -> String {
    let mut package = json!({
        "license": license,
        "signature": hex::encode(signature),
    });
    if let Some(cert) = certificate_b64 {
        package["certificate"] = Value::String(cert.to_string());
    }
    serde_json::to_string_pretty(&package).unwrap()
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// SubjectPublicKeyInfo PEM for a key, as shipped to deployments.
pub fn public_key_pem(key: &RsaPrivateKey) -> String {
    key.to_public_key()
        .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
        .unwrap()
}

/// Builds an X.509 subject from (dotted OID, value) pairs.
pub fn subject(attrs: &[(&str, &str)]) -> Name {
    let rdns = attrs
        .iter()
        .map(|(oid, value)| {
            let atv = AttributeTypeAndValue {
                oid: ObjectIdentifier::new(oid).unwrap(),
                value: Any::encode_from(&Utf8StringRef::new(value).unwrap()).unwrap(),
            };
            RelativeDistinguishedName(SetOfVec::try_from(vec![atv]).unwrap())
        })
        .collect();
    RdnSequence(rdns)
}

/// Subject with organizationName and the org-ID serialNumber attribute,
/// matching issued customer certificates.
pub fn customer_subject(org_name: &str, org_id: &str) -> Name {
    subject(&[("2.5.4.10", org_name), ("2.5.4.5", org_id)])
}

fn spki_for(key: &RsaPrivateKey) -> SubjectPublicKeyInfoOwned {
    let der = key.to_public_key().to_public_key_der().unwrap();
    SubjectPublicKeyInfoOwned::from_der(der.as_bytes()).unwrap()
}

fn validity(not_before_days_ago: i64, not_after_days_ahead: i64) -> Validity {
    let now = SystemTime::now();
    let not_before = if not_before_days_ago >= 0 {
        now - Duration::from_secs(not_before_days_ago as u64 * DAY)
    } else {
        now + Duration::from_secs((-not_before_days_ago) as u64 * DAY)
    };
    let not_after = if not_after_days_ahead >= 0 {
        now + Duration::from_secs(not_after_days_ahead as u64 * DAY)
    } else {
        now - Duration::from_secs((-not_after_days_ahead) as u64 * DAY)
    };
    Validity {
        not_before: Time::try_from(not_before).unwrap(),
        not_after: Time::try_from(not_after).unwrap(),
    }
}

/// Self-signed certificate (org-certificate deployments).
pub fn self_signed_cert_pem(
    key: &RsaPrivateKey,
    subject: Name,
    not_before_days_ago: i64,
    not_after_days_ahead: i64,
) -> String {
    let signer = CertSigningKey::<Sha256>::new(key.clone());
    let builder = CertificateBuilder::new(
        Profile::Root,
        SerialNumber::new(&[0x01]).unwrap(),
        validity(not_before_days_ago, not_after_days_ahead),
        subject,
        spki_for(key),
        &signer,
    )
    .unwrap();
    let cert = builder.build::<rsa::pkcs1v15::Signature>().unwrap();
    cert.to_pem(rsa::pkcs8::LineEnding::LF).unwrap()
}

/// CA-signed leaf certificate (certificate-embedded deployments).
pub fn ca_signed_cert_pem(
    ca: &RsaPrivateKey,
    ca_subject: Name,
    leaf_key: &RsaPrivateKey,
    leaf_subject: Name,
    not_before_days_ago: i64,
    not_after_days_ahead: i64,
) -> String {
    let signer = CertSigningKey::<Sha256>::new(ca.clone());
    let builder = CertificateBuilder::new(
        Profile::Leaf {
            issuer: ca_subject,
            enable_key_agreement: false,
            enable_key_encipherment: false,
        },
        SerialNumber::new(&[0x02]).unwrap(),
        validity(not_before_days_ago, not_after_days_ahead),
        leaf_subject,
        spki_for(leaf_key),
        &signer,
    )
    .unwrap();
    let cert = builder.build::<rsa::pkcs1v15::Signature>().unwrap();
    cert.to_pem(rsa::pkcs8::LineEnding::LF).unwrap()
}

/// Base64 wrapping of a PEM certificate for the package `certificate` field.
pub fn cert_b64(pem: &str) -> String {
    BASE64.encode(pem.as_bytes())
}
