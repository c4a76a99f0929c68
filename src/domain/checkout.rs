use super::principal::PrincipalId;
use super::subscription::SubscriptionTier;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Caller-scoped token forwarded to the payment provider so a retried
/// request after a timeout has at most one effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pending upgrade awaiting asynchronous confirmation from the billing
/// authority.
///
/// Created after the checkout session exists, discarded once a confirmation
/// lands or the confirmation window elapses. Repeated upgrade clicks while
/// an intent is pending re-use its session instead of minting another.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutIntent {
    pub principal: PrincipalId,
    pub requested_tier: SubscriptionTier,
    pub idempotency_key: IdempotencyKey,
    pub checkout_url: String,
    pub created_at: DateTime<Utc>,
}

impl CheckoutIntent {
    pub fn expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.created_at) > ttl
    }
}
