//! `X-Hub-Signature-256` verification.

use super::WebhookError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Verifies a `sha256=<hex>` signature over the raw request body.
///
/// The comparison is constant time.
///
/// # Errors
///
/// Returns [`WebhookError::MissingSignature`] when `header` is `None`, and
/// [`WebhookError::InvalidSignature`] when it is malformed or does not match.
pub fn verify_signature(
    secret: &[u8],
    header: Option<&str>,
    body: &[u8],
) -> Result<(), WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;
    let expected = header
        .trim()
        .strip_prefix(PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or(WebhookError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature)
}

/// Computes the `sha256=<hex>` signature header value for `body`.
#[cfg(test)]
pub(crate) fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).unwrap();
    mac.update(body);
    format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}
