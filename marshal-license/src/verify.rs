//! RSA-PSS signature verification.
//!
//! License signatures use PSS with an MGF1-SHA-256 mask and the maximum
//! salt length for the key (`k - hLen - 2`), over a SHA-256 digest of the
//! canonical signing bytes. The salt length is derived from the key size so
//! verification agrees with issuers that sign at maximum salt.

use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Maximum PSS salt length for a modulus of `modulus_bytes` bytes.
#[must_use]
pub fn max_salt_len(modulus_bytes: usize) -> usize {
    modulus_bytes - Sha256::output_size() - 2
}

/// Verifies a PSS signature over `message` with maximum-salt padding.
///
/// # Errors
///
/// Returns the underlying RSA error on any verification failure.
pub fn verify_pss(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> rsa::Result<()> {
    let digest = Sha256::digest(message);
    let scheme = Pss::new_with_salt::<Sha256>(max_salt_len(key.size()));
    key.verify(scheme, &digest, signature)
}
