use crate::domain::checkout::IdempotencyKey;
use crate::domain::course::Course;
use crate::domain::ports::{
    BillingGateway, CasOutcome, CheckoutSession, CourseCatalog, IdentityProvider, PortalSession,
    SubscriptionStore,
};
use crate::domain::principal::{PrincipalId, Role};
use crate::domain::subscription::{SubscriptionRecord, SubscriptionTier};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory subscription store.
///
/// Uses `Arc<RwLock<HashMap<PrincipalId, SubscriptionRecord>>>` for shared
/// concurrent access; the write lock makes `compare_and_swap` atomic per
/// principal. Ideal for tests, replay runs and small deployments where
/// persistence is not required.
#[derive(Default, Clone)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<HashMap<PrincipalId, SubscriptionRecord>>>,
}

impl InMemorySubscriptionStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, principal: &PrincipalId) -> Result<Option<SubscriptionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(principal).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected_version: Option<u64>,
        record: SubscriptionRecord,
    ) -> Result<CasOutcome> {
        let mut records = self.records.write().await;
        let current = records.get(&record.principal).map(|r| r.version);
        if current != expected_version {
            return Ok(CasOutcome::Conflict);
        }
        records.insert(record.principal.clone(), record);
        Ok(CasOutcome::Committed)
    }

    async fn all_records(&self) -> Result<Vec<SubscriptionRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<SubscriptionRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.principal.as_str().cmp(b.principal.as_str()));
        Ok(all)
    }
}

/// In-memory identity collaborator: a role table keyed by principal.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    roles: Arc<RwLock<HashMap<PrincipalId, Role>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assign(&self, principal: PrincipalId, role: Role) {
        self.roles.write().await.insert(principal, role);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn role_of(&self, principal: &PrincipalId) -> Result<Option<Role>> {
        let roles = self.roles.read().await;
        Ok(roles.get(principal).copied())
    }
}

/// In-memory course catalog.
#[derive(Default)]
pub struct InMemoryCourseCatalog {
    courses: Arc<RwLock<HashMap<String, Course>>>,
}

impl InMemoryCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, course: Course) {
        self.courses.write().await.insert(course.id.clone(), course);
    }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
    async fn course(&self, course_id: &str) -> Result<Option<Course>> {
        let courses = self.courses.read().await;
        Ok(courses.get(course_id).cloned())
    }
}

/// Gateway adapter for hosts that only replay recorded confirmations and
/// never contact the payment provider. Every call reports the provider as
/// unavailable.
pub struct OfflineGateway;

#[async_trait]
impl BillingGateway for OfflineGateway {
    async fn create_checkout_session(
        &self,
        _principal: &PrincipalId,
        _tier: SubscriptionTier,
        _key: &IdempotencyKey,
    ) -> Result<CheckoutSession> {
        Err(EngineError::GatewayUnavailable("offline replay".into()))
    }

    async fn create_portal_session(&self, _principal: &PrincipalId) -> Result<PortalSession> {
        Err(EngineError::GatewayUnavailable("offline replay".into()))
    }

    async fn fetch_authoritative_status(
        &self,
        _principal: &PrincipalId,
    ) -> Result<SubscriptionRecord> {
        Err(EngineError::GatewayUnavailable("offline replay".into()))
    }
}
