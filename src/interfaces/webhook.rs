//! Signed webhook intake from the payment provider.
//!
//! Payloads are untrusted input: the signature header must verify against
//! the shared secret and the timestamp must be recent before the body is
//! parsed and handed to the reconciliation service. An invalid signature is
//! rejected, never applied.

use crate::domain::principal::PrincipalId;
use crate::domain::subscription::{SubscriptionRecord, SubscriptionStatus, SubscriptionTier};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Wire form of a subscription confirmation pushed by the provider.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ConfirmationPayload {
    pub principal: PrincipalId,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub external_subscription_id: Option<String>,
    pub version: u64,
}

impl ConfirmationPayload {
    pub fn into_record(self, now: DateTime<Utc>) -> SubscriptionRecord {
        SubscriptionRecord {
            principal: self.principal,
            tier: self.tier,
            status: self.status,
            external_subscription_id: self.external_subscription_id,
            version: self.version,
            last_synced_at: now,
        }
    }
}

/// Verifies `t=<unix>,v1=<hex hmac-sha256>` signature headers against a
/// shared secret, with a bounded timestamp tolerance against replay.
pub struct WebhookVerifier {
    secret: String,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: Duration::minutes(5),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Authenticates and decodes one webhook delivery.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<ConfirmationPayload> {
        let (timestamp, signature) = parse_signature_header(signature_header)?;

        let age = (Utc::now().timestamp() - timestamp).abs();
        if age > self.tolerance.num_seconds() {
            warn!(timestamp, age, "webhook timestamp outside tolerance");
            return Err(EngineError::WebhookRejected(
                "timestamp outside tolerance".into(),
            ));
        }

        let body = std::str::from_utf8(payload)
            .map_err(|_| EngineError::WebhookRejected("payload is not valid UTF-8".into()))?;
        let signed_payload = format!("{timestamp}.{body}");

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| EngineError::WebhookRejected("invalid webhook secret".into()))?;
        mac.update(signed_payload.as_bytes());

        let expected = hex::decode(&signature)
            .map_err(|_| EngineError::WebhookRejected("signature is not valid hex".into()))?;
        if mac.verify_slice(&expected).is_err() {
            warn!("webhook signature mismatch");
            return Err(EngineError::WebhookRejected("signature mismatch".into()));
        }

        serde_json::from_str(body)
            .map_err(|e| EngineError::WebhookRejected(format!("malformed payload: {e}")))
    }

    /// Produces the signature header for a payload at `timestamp`. Used by
    /// local provider simulations and tests.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let body = String::from_utf8_lossy(payload);
        let signed_payload = format!("{timestamp}.{body}");
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(signed_payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }
}

fn parse_signature_header(header: &str) -> Result<(i64, String)> {
    let mut timestamp: Option<i64> = None;
    let mut v1_signature: Option<String> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => v1_signature = Some(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| EngineError::WebhookRejected("missing timestamp in signature header".into()))?;
    let signature = v1_signature
        .ok_or_else(|| EngineError::WebhookRejected("missing v1 signature in header".into()))?;
    Ok((timestamp, signature))
}
