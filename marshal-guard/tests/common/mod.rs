//! Shared fixtures for guard tests: direct public-key licenses.

#![allow(dead_code)]

use marshal_license::{max_salt_len, to_canonical_json, TrustAnchor, Validator};
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub fn issuer_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("rsa keygen"))
}

pub fn license_value(customer_id: &str, expiration: &str) -> Value {
    json!({
        "customer_id": customer_id,
        "modules": ["counting"],
        "issued_on": "01-01-2025",
        "expiration": expiration,
    })
}

pub fn signed_package(license: &Value) -> String {
    let digest = Sha256::digest(to_canonical_json(license).as_bytes());
    let key = issuer_key();
    let scheme = Pss::new_with_salt::<Sha256>(max_salt_len(key.size()));
    let signature = key
        .sign_with_rng(&mut rand::thread_rng(), scheme, &digest)
        .expect("pss sign");
    serde_json::to_string(&json!({
        "license": license,
        "signature": hex::encode(signature),
    }))
    .unwrap()
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Validator over a public-key anchor with a license already on disk.
pub fn validator_in(dir: &Path, package: &str) -> Validator {
    let pem = issuer_key()
        .to_public_key()
        .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
        .unwrap();
    let key_path = write_file(dir, "marshal_public.pem", &pem);
    let license_path = write_file(dir, "license.lic", package);
    let anchor = TrustAnchor::public_key_from_file(&key_path).unwrap();
    Validator::new(license_path, anchor)
}
