use super::checkout::IdempotencyKey;
use super::course::Course;
use super::principal::{PrincipalId, Role};
use super::subscription::{SubscriptionRecord, SubscriptionTier};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of an optimistic per-principal write.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CasOutcome {
    /// The caller's version expectation held and the record was stored.
    Committed,
    /// Another writer got there first; re-read and retry.
    Conflict,
}

/// Authoritative-cache abstraction over the durable row store.
///
/// Writes go through `compare_and_swap` only: of two racers against the same
/// principal with the same expectation, exactly one commits. Transient store
/// unavailability surfaces as an error, never as a silent default.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get(&self, principal: &PrincipalId) -> Result<Option<SubscriptionRecord>>;

    /// Atomic per-principal compare-and-swap. `expected_version = None`
    /// means create-only: the write conflicts if any record already exists.
    async fn compare_and_swap(
        &self,
        expected_version: Option<u64>,
        record: SubscriptionRecord,
    ) -> Result<CasOutcome>;

    async fn all_records(&self) -> Result<Vec<SubscriptionRecord>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortalSession {
    pub url: String,
}

/// External payment provider. All three calls are slow, fallible network
/// operations: callers bound them with a timeout and hold no lock across
/// them. The idempotency key is forwarded verbatim so a retry after a
/// timeout cannot mint a second checkout session.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        principal: &PrincipalId,
        tier: SubscriptionTier,
        key: &IdempotencyKey,
    ) -> Result<CheckoutSession>;

    async fn create_portal_session(&self, principal: &PrincipalId) -> Result<PortalSession>;

    async fn fetch_authoritative_status(
        &self,
        principal: &PrincipalId,
    ) -> Result<SubscriptionRecord>;
}

/// Identity collaborator. Trusted, never mutated by this engine.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn role_of(&self, principal: &PrincipalId) -> Result<Option<Role>>;
}

/// Read-only course catalog collaborator.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn course(&self, course_id: &str) -> Result<Option<Course>>;
}

pub type SubscriptionStoreRef = Arc<dyn SubscriptionStore>;
pub type BillingGatewayRef = Arc<dyn BillingGateway>;
pub type IdentityProviderRef = Arc<dyn IdentityProvider>;
pub type CourseCatalogRef = Arc<dyn CourseCatalog>;
