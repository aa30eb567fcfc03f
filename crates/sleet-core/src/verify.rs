//! RequestVerifier trait definition.
//!
//! Authenticates an inbound request from its timestamp header, raw body and
//! decoded signature. The Ed25519 implementation lives in sleet-infra.

use sleet_types::error::AuthError;

/// Verifies that a request was signed by the platform.
///
/// The signed message is the timestamp bytes immediately followed by the
/// body bytes, exactly as received.
pub trait RequestVerifier: Send + Sync {
    fn verify(&self, timestamp: &str, body: &[u8], signature: &[u8]) -> Result<(), AuthError>;
}
