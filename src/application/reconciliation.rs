use crate::domain::checkout::{CheckoutIntent, IdempotencyKey};
use crate::domain::ports::{
    BillingGatewayRef, CasOutcome, CheckoutSession, IdentityProviderRef, PortalSession,
    SubscriptionStoreRef,
};
use crate::domain::principal::{PrincipalId, Role};
use crate::domain::subscription::{SubscriptionRecord, SubscriptionTier};
use crate::error::{EngineError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Tunables for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Upper bound on any single gateway call; past it the call counts as
    /// failed, not hung.
    pub gateway_timeout: std::time::Duration,
    /// CAS retry budget when applying a confirmation.
    pub max_apply_attempts: u32,
    /// Confirmation window for a pending checkout intent.
    pub intent_ttl: chrono::Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: std::time::Duration::from_secs(10),
            max_apply_attempts: 3,
            intent_ttl: chrono::Duration::minutes(30),
        }
    }
}

/// Result of merging an external confirmation into the cache.
#[derive(Debug, PartialEq, Clone)]
pub enum MergeOutcome {
    /// The confirmation superseded the stored record.
    Applied(SubscriptionRecord),
    /// Version at or below the stored one; dropped without effect.
    Stale,
}

/// Orchestrates refresh-on-demand and confirmation-driven updates against
/// the external billing authority.
///
/// Per principal the service moves between `Synced` (no pending intent),
/// `AwaitingConfirmation` (an unexpired [`CheckoutIntent`] is recorded) and
/// a transient reconciling phase inside [`apply_confirmation`]. It is the
/// only component that writes the subscription store; every write is
/// version-checked rather than blindly overwritten.
///
/// [`apply_confirmation`]: ReconciliationService::apply_confirmation
pub struct ReconciliationService {
    store: SubscriptionStoreRef,
    gateway: BillingGatewayRef,
    identity: IdentityProviderRef,
    intents: RwLock<HashMap<PrincipalId, CheckoutIntent>>,
    key_seq: AtomicU64,
    config: ReconcilerConfig,
}

impl ReconciliationService {
    pub fn new(
        store: SubscriptionStoreRef,
        gateway: BillingGatewayRef,
        identity: IdentityProviderRef,
    ) -> Self {
        Self::with_config(store, gateway, identity, ReconcilerConfig::default())
    }

    pub fn with_config(
        store: SubscriptionStoreRef,
        gateway: BillingGatewayRef,
        identity: IdentityProviderRef,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            identity,
            intents: RwLock::new(HashMap::new()),
            key_seq: AtomicU64::new(0),
            config,
        }
    }

    /// Seeds the version-0 free record at account creation.
    ///
    /// Create-only: losing a duplicate-registration race is a no-op for the
    /// loser and the existing record is returned.
    pub async fn register_principal(
        &self,
        principal: &PrincipalId,
        role: Role,
    ) -> Result<SubscriptionRecord> {
        let record = SubscriptionRecord::initial(principal.clone(), role, Utc::now())
            .ok_or(EngineError::AuthenticationRequired)?;

        match self.store.compare_and_swap(None, record.clone()).await? {
            CasOutcome::Committed => {
                info!(principal = %principal, tier = %record.tier, "principal registered");
                Ok(record)
            }
            CasOutcome::Conflict => {
                self.store.get(principal).await?.ok_or_else(|| {
                    EngineError::StoreUnavailable("record vanished during registration".into())
                })
            }
        }
    }

    /// Starts a checkout for a paid tier and returns the redirect URL.
    ///
    /// Free and unrecognized tiers are rejected without a network call. If
    /// an unexpired intent for the same tier is pending, its session is
    /// returned again instead of minting a second one. On gateway failure no
    /// intent persists and the principal stays `Synced`.
    pub async fn request_upgrade(
        &self,
        principal: &PrincipalId,
        tier: SubscriptionTier,
    ) -> Result<CheckoutSession> {
        self.require_identity(principal).await?;
        if !tier.is_paid() {
            return Err(EngineError::GatewayRejected(format!(
                "tier {tier} cannot be purchased"
            )));
        }

        let now = Utc::now();
        if let Some(intent) = self.pending_intent(principal).await
            && intent.requested_tier == tier
        {
            debug!(principal = %principal, tier = %tier, "re-using pending checkout session");
            return Ok(CheckoutSession {
                url: intent.checkout_url,
            });
        }

        let key = self.mint_key(principal);
        let session = self
            .bounded(self.gateway.create_checkout_session(principal, tier, &key))
            .await?;

        let intent = CheckoutIntent {
            principal: principal.clone(),
            requested_tier: tier,
            idempotency_key: key,
            checkout_url: session.url.clone(),
            created_at: now,
        };
        self.intents.write().await.insert(principal.clone(), intent);
        info!(principal = %principal, tier = %tier, "checkout session created");
        Ok(session)
    }

    /// Opens a customer-portal session for plan management. No intent
    /// bookkeeping; whatever the user does there arrives later as a
    /// confirmation or through a manual refresh.
    pub async fn request_manage_portal(&self, principal: &PrincipalId) -> Result<PortalSession> {
        self.require_identity(principal).await?;
        self.bounded(self.gateway.create_portal_session(principal))
            .await
    }

    /// Merges an externally confirmed subscription state into the cache.
    ///
    /// Confirmations apply in non-decreasing version order per principal: a
    /// version at or below the stored one is discarded as stale, which makes
    /// duplicate and out-of-order delivery safe. On a write conflict the
    /// current record is re-read and the merge retried up to the configured
    /// budget.
    pub async fn apply_confirmation(
        &self,
        confirmation: SubscriptionRecord,
    ) -> Result<MergeOutcome> {
        let principal = confirmation.principal.clone();
        let mut record = confirmation;
        record.last_synced_at = Utc::now();

        for attempt in 1..=self.config.max_apply_attempts {
            let stored = self.store.get(&principal).await?;
            if let Some(stored) = &stored
                && !record.supersedes(stored)
            {
                debug!(
                    principal = %principal,
                    incoming = record.version,
                    stored = stored.version,
                    "stale confirmation discarded"
                );
                return Ok(MergeOutcome::Stale);
            }

            let expected = stored.as_ref().map(|r| r.version);
            match self.store.compare_and_swap(expected, record.clone()).await? {
                CasOutcome::Committed => {
                    self.intents.write().await.remove(&principal);
                    info!(
                        principal = %principal,
                        version = record.version,
                        tier = %record.tier,
                        status = %record.status,
                        "confirmation applied"
                    );
                    return Ok(MergeOutcome::Applied(record));
                }
                CasOutcome::Conflict => {
                    debug!(principal = %principal, attempt, "version conflict, re-reading");
                }
            }
        }

        Err(EngineError::ReconciliationFailed {
            attempts: self.config.max_apply_attempts,
        })
    }

    /// Synchronous authoritative refresh, allowed from any state. Gives the
    /// user a way to force progress when the asynchronous delivery path
    /// failed.
    pub async fn refresh_subscription(
        &self,
        principal: &PrincipalId,
    ) -> Result<SubscriptionRecord> {
        self.require_identity(principal).await?;
        let fresh = self
            .bounded(self.gateway.fetch_authoritative_status(principal))
            .await?;

        match self.apply_confirmation(fresh).await? {
            MergeOutcome::Applied(record) => Ok(record),
            // The provider's answer was already reflected locally.
            MergeOutcome::Stale => self.store.get(principal).await?.ok_or_else(|| {
                EngineError::StoreUnavailable("record vanished during refresh".into())
            }),
        }
    }

    /// The unexpired intent for a principal, if a checkout is awaiting
    /// confirmation.
    pub async fn pending_intent(&self, principal: &PrincipalId) -> Option<CheckoutIntent> {
        let now = Utc::now();
        let intents = self.intents.read().await;
        intents
            .get(principal)
            .filter(|intent| !intent.expired_at(now, self.config.intent_ttl))
            .cloned()
    }

    /// Drops intents whose confirmation window elapsed and returns how many
    /// were discarded. The effective tier of an expired intent stays
    /// whatever was last synced; a later manual refresh reconciles against
    /// whatever the provider actually did.
    pub async fn expire_stale_intents(&self) -> usize {
        let now = Utc::now();
        let mut intents = self.intents.write().await;
        let before = intents.len();
        intents.retain(|_, intent| !intent.expired_at(now, self.config.intent_ttl));
        let dropped = before - intents.len();
        if dropped > 0 {
            info!(dropped, "expired checkout intents discarded");
        }
        dropped
    }

    async fn require_identity(&self, principal: &PrincipalId) -> Result<()> {
        match self.identity.role_of(principal).await? {
            Some(_) => Ok(()),
            None => Err(EngineError::AuthenticationRequired),
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.gateway_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::GatewayUnavailable(format!(
                "no response within {:?}",
                self.config.gateway_timeout
            ))),
        }
    }

    fn mint_key(&self, principal: &PrincipalId) -> IdempotencyKey {
        let seq = self.key_seq.fetch_add(1, Ordering::Relaxed);
        IdempotencyKey::new(format!("ck-{principal}-{seq}"))
    }
}
