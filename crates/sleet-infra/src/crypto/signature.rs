//! Ed25519 request verification.
//!
//! Implements the `RequestVerifier` trait from `sleet-core` using
//! `ed25519-dalek`. The verifying key is parsed once at startup from the
//! hex-encoded application public key.

use ed25519_dalek::{PUBLIC_KEY_LENGTH, Signature, Verifier, VerifyingKey};

use sleet_core::verify::RequestVerifier;
use sleet_types::error::{AuthError, ConfigError};

/// Verifies `timestamp || body` against the application's Ed25519 key.
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Parse a hex-encoded 32-byte public key.
    pub fn from_hex(public_key: &str) -> Result<Self, ConfigError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| ConfigError::InvalidPublicKey(format!("not valid hex: {e}")))?;

        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            ConfigError::InvalidPublicKey(format!(
                "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;

        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ConfigError::InvalidPublicKey(e.to_string()))?;

        Ok(Self { key })
    }

    pub fn from_key(key: VerifyingKey) -> Self {
        Self { key }
    }
}

impl RequestVerifier for Ed25519Verifier {
    fn verify(&self, timestamp: &str, body: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        let signature = Signature::from_slice(signature).map_err(|_| AuthError::BadSignature)?;

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| AuthError::BadSignature)
    }
}
