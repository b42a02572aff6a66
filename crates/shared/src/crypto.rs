//! Cryptographic utilities for signing outbound payloads.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Prefix placed in front of hex-encoded signatures.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Errors raised while signing a payload.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

/// Signs a payload with HMAC-SHA256 and returns `sha256=<hex>`.
pub fn sign_payload(payload: &str, secret: &str) -> Result<String, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{}{}", SIGNATURE_PREFIX, signature))
}

/// Verifies a `sha256=<hex>` signature against the payload.
pub fn verify_signature(payload: &str, secret: &str, signature: &str) -> bool {
    let Some(hex_part) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_part) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
