use crate::domain::entitlement::{self, Decision};
use crate::domain::ports::{CourseCatalogRef, IdentityProviderRef, SubscriptionStoreRef};
use crate::domain::principal::PrincipalId;
use crate::domain::subscription::SubscriptionTier;
use crate::error::{EngineError, Result};
use tracing::debug;

/// Read-only facade the presentation layer asks for decisions.
///
/// Never performs network I/O: it reads the subscription cache, resolves the
/// course through the catalog collaborator and delegates to the pure policy
/// in [`entitlement`]. A principal with no record yet evaluates at the free
/// tier of its role family rather than failing the call.
pub struct AccessGate {
    store: SubscriptionStoreRef,
    identity: IdentityProviderRef,
    catalog: CourseCatalogRef,
}

impl AccessGate {
    pub fn new(
        store: SubscriptionStoreRef,
        identity: IdentityProviderRef,
        catalog: CourseCatalogRef,
    ) -> Self {
        Self {
            store,
            identity,
            catalog,
        }
    }

    pub async fn is_entitled(&self, principal: &PrincipalId, course_id: &str) -> Result<bool> {
        Ok(self.decision(principal, course_id).await?.is_granted())
    }

    /// Full decision including the denial reason, for callers that render
    /// upgrade prompts.
    pub async fn decision(&self, principal: &PrincipalId, course_id: &str) -> Result<Decision> {
        let role = self
            .identity
            .role_of(principal)
            .await?
            .ok_or(EngineError::AuthenticationRequired)?;
        let course = self
            .catalog
            .course(course_id)
            .await?
            .ok_or_else(|| EngineError::CourseNotFound(course_id.to_string()))?;

        let tier = match self.store.get(principal).await? {
            Some(record) => record.tier,
            None => SubscriptionTier::free_for_role(role).unwrap_or(SubscriptionTier::Unknown),
        };

        let decision = entitlement::evaluate(role, tier, &course);
        if let Decision::Denied(reason) = &decision {
            debug!(principal = %principal, course = course_id, ?reason, "entitlement denied");
        }
        Ok(decision)
    }

    pub async fn current_tier(&self, principal: &PrincipalId) -> Result<SubscriptionTier> {
        if let Some(record) = self.store.get(principal).await? {
            return Ok(record.tier);
        }
        let role = self
            .identity
            .role_of(principal)
            .await?
            .ok_or(EngineError::AuthenticationRequired)?;
        SubscriptionTier::free_for_role(role).ok_or(EngineError::AuthenticationRequired)
    }
}
