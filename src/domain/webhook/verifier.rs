//! Gateway webhook signature verification.
//!
//! The gateway signs the exact raw request body with HMAC-SHA256 using a
//! shared secret and sends the lowercase hex digest in a header. The body
//! must be verified before it is parsed.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

/// Verifier for gateway webhook signatures.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Checks `signature_header` against the HMAC of `payload`.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - header absent or blank
    /// - `InvalidSignature` - header is not hex or does not match
    pub fn verify(&self, payload: &[u8], signature_header: Option<&str>) -> Result<(), WebhookError> {
        let header = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let provided = hex::decode(header).map_err(|_| WebhookError::InvalidSignature)?;
        let expected = self.compute_signature(payload)?;

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    fn compute_signature(&self, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Constant-time comparison; differing lengths short-circuit to false.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Hex HMAC-SHA256 of `payload`, as the gateway would send it.
///
/// Exposed for test fixtures and local webhook replay tooling.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
