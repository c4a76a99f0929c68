#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use classgate::application::access_gate::AccessGate;
use classgate::application::reconciliation::{ReconcilerConfig, ReconciliationService};
use classgate::domain::checkout::IdempotencyKey;
use classgate::domain::course::{Course, CourseCategory};
use classgate::domain::ports::{BillingGateway, CheckoutSession, PortalSession};
use classgate::domain::principal::{PrincipalId, Role};
use classgate::domain::subscription::{SubscriptionRecord, SubscriptionStatus, SubscriptionTier};
use classgate::error::{EngineError, Result};
use classgate::infrastructure::in_memory::{
    InMemoryCourseCatalog, InMemoryIdentityProvider, InMemorySubscriptionStore,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Mutex;

/// Gateway double with scriptable failures, latency and authoritative
/// status, plus call counters for idempotence assertions.
pub struct ScriptedGateway {
    pub checkout_calls: AtomicU32,
    pub portal_calls: AtomicU32,
    unavailable: AtomicBool,
    delay: Option<std::time::Duration>,
    authoritative: Mutex<Option<SubscriptionRecord>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            checkout_calls: AtomicU32::new(0),
            portal_calls: AtomicU32::new(0),
            unavailable: AtomicBool::new(false),
            delay: None,
            authoritative: Mutex::new(None),
        }
    }

    pub fn with_delay(delay: std::time::Duration) -> Self {
        let mut gateway = Self::new();
        gateway.delay = Some(delay);
        gateway
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn set_authoritative(&self, record: SubscriptionRecord) {
        *self.authoritative.lock().await = Some(record);
    }

    async fn guard(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::GatewayUnavailable("scripted outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BillingGateway for ScriptedGateway {
    async fn create_checkout_session(
        &self,
        _principal: &PrincipalId,
        _tier: SubscriptionTier,
        key: &IdempotencyKey,
    ) -> Result<CheckoutSession> {
        self.guard().await?;
        let n = self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CheckoutSession {
            url: format!("https://pay.example/checkout/{n}-{}", key.as_str()),
        })
    }

    async fn create_portal_session(&self, _principal: &PrincipalId) -> Result<PortalSession> {
        self.guard().await?;
        self.portal_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PortalSession {
            url: "https://pay.example/portal".into(),
        })
    }

    async fn fetch_authoritative_status(
        &self,
        principal: &PrincipalId,
    ) -> Result<SubscriptionRecord> {
        self.guard().await?;
        let status = self.authoritative.lock().await;
        status.clone().ok_or_else(|| {
            EngineError::GatewayRejected(format!("no subscription on file for {principal}"))
        })
    }
}

pub struct Harness {
    pub store: Arc<InMemorySubscriptionStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub catalog: Arc<InMemoryCourseCatalog>,
    pub gateway: Arc<ScriptedGateway>,
    pub service: Arc<ReconciliationService>,
    pub gate: AccessGate,
}

/// Engine wired against in-memory collaborators, with `alice` (student) and
/// `bob` (teacher) known to the identity provider and a small course
/// catalog.
pub async fn harness() -> Harness {
    harness_with(ReconcilerConfig::default(), ScriptedGateway::new()).await
}

pub async fn harness_with(config: ReconcilerConfig, gateway: ScriptedGateway) -> Harness {
    let store = Arc::new(InMemorySubscriptionStore::new());

    let identity = Arc::new(InMemoryIdentityProvider::new());
    identity.assign(PrincipalId::new("alice"), Role::Student).await;
    identity.assign(PrincipalId::new("bob"), Role::Teacher).await;

    let catalog = Arc::new(InMemoryCourseCatalog::new());
    catalog
        .insert(Course::new("python-fundamentals", CourseCategory::Coding))
        .await;
    catalog
        .insert(
            Course::new("ethical-hacking", CourseCategory::Cybersecurity)
                .with_minimum_tier(SubscriptionTier::PremiumStudent),
        )
        .await;
    catalog
        .insert(Course::new("grading-workflows", CourseCategory::Business).with_audience(Role::Teacher))
        .await;

    let gateway = Arc::new(gateway);
    let service = Arc::new(ReconciliationService::with_config(
        store.clone(),
        gateway.clone(),
        identity.clone(),
        config,
    ));
    let gate = AccessGate::new(store.clone(), identity.clone(), catalog.clone());

    Harness {
        store,
        identity,
        catalog,
        gateway,
        service,
        gate,
    }
}

pub fn alice() -> PrincipalId {
    PrincipalId::new("alice")
}

pub fn bob() -> PrincipalId {
    PrincipalId::new("bob")
}

pub fn confirmation(principal: &str, tier: SubscriptionTier, version: u64) -> SubscriptionRecord {
    SubscriptionRecord {
        principal: PrincipalId::new(principal),
        tier,
        status: SubscriptionStatus::Active,
        external_subscription_id: Some(format!("sub_{version}")),
        version,
        last_synced_at: Utc::now(),
    }
}
