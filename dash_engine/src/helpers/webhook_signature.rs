//! Signed payment-gateway callbacks.
//!
//! The gateway signs each callback with a shared secret and sends the signature in the [`SIGNATURE_HEADER`] header:
//!
//! ```text
//! t=1718000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! `v1` is the hex-encoded HMAC-SHA256 of `"{t}.{payload}"`. A header may carry more than one `v1` entry while the
//! secret is being rotated; the callback is accepted if any of them matches. The timestamp bounds replays.
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "Dash-Signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSignatureError {
    #[error("The signature header is malformed: {0}")]
    MalformedHeader(String),
    #[error("The signature timestamp {0} is outside the tolerance window")]
    StaleTimestamp(i64),
    #[error("No signature in the header matches the payload")]
    SignatureMismatch,
    #[error("No webhook secret has been configured")]
    MissingSecret,
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookSignatureError> {
    if secret.is_empty() {
        return Err(WebhookSignatureError::MissingSecret);
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookSignatureError::MalformedHeader(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Produces a signature header for `payload`, as the payment gateway would.
pub fn sign_payload(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, WebhookSignatureError> {
    let signature = mac_for(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(signature)))
}

/// Verifies a signature header against the payload. Returns the signed timestamp on success.
///
/// The timestamp must lie within `tolerance` of `now`, in either direction. Signatures are compared in constant time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<i64, WebhookSignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or_else(|| WebhookSignatureError::MalformedHeader(format!("'{part}' is not a key=value pair")))?;
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|_| WebhookSignatureError::MalformedHeader(format!("invalid timestamp '{value}'")))?;
                timestamp = Some(t);
            },
            "v1" => {
                let sig = hex::decode(value)
                    .map_err(|e| WebhookSignatureError::MalformedHeader(format!("invalid v1 signature: {e}")))?;
                signatures.push(sig);
            },
            // other schemes are ignored
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| WebhookSignatureError::MalformedHeader("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(WebhookSignatureError::MalformedHeader("missing v1 signature".into()));
    }
    if now.timestamp().abs_diff(timestamp) > tolerance.num_seconds().unsigned_abs() {
        warn!("🔐️ Webhook signature timestamp {timestamp} is outside the {}s tolerance", tolerance.num_seconds());
        return Err(WebhookSignatureError::StaleTimestamp(timestamp));
    }
    let mac = mac_for(secret, timestamp, payload)?;
    let valid = signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if valid {
        trace!("🔐️ Webhook signature check ✅️");
        Ok(timestamp)
    } else {
        warn!("🔐️ Invalid webhook signature. Rejecting callback.");
        Err(WebhookSignatureError::SignatureMismatch)
    }
}
