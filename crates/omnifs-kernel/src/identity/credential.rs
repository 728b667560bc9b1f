//! Credential digests.
//!
//! SHA-256 of the secret, hex-encoded over the first 31 digest bytes. The
//! last byte is dropped; user tables hold 62-char digests in this form.

use sha2::{Digest, Sha256};

/// Digest bytes that make it into the stored hex string.
pub const DIGEST_BYTES_KEPT: usize = 31;

/// Hash a plaintext secret into its stored form.
pub fn hash_credential(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..DIGEST_BYTES_KEPT])
}

/// Compare a plaintext secret against a stored digest.
pub fn verify_credential(secret: &str, stored: &str) -> bool {
    hash_credential(secret) == stored
}
