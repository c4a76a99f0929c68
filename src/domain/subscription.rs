use super::principal::{PrincipalId, Role, RoleFamily};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription plan. Exactly one tier is active per principal at any
/// instant; the free tiers are seeded at account creation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    FreeStudent,
    PremiumStudent,
    FreeTeacher,
    PremiumTeacher,
    Personal,
    /// Unrecognized value from storage or the billing authority. Grants
    /// nothing.
    #[serde(other)]
    Unknown,
}

impl SubscriptionTier {
    pub fn family(&self) -> Option<RoleFamily> {
        match self {
            SubscriptionTier::FreeStudent | SubscriptionTier::PremiumStudent => {
                Some(RoleFamily::Student)
            }
            SubscriptionTier::FreeTeacher | SubscriptionTier::PremiumTeacher => {
                Some(RoleFamily::Teacher)
            }
            SubscriptionTier::Personal => Some(RoleFamily::Personal),
            SubscriptionTier::Unknown => None,
        }
    }

    /// Position in the family ordering: free < premium < personal.
    pub fn rank(&self) -> Option<u8> {
        match self {
            SubscriptionTier::FreeStudent | SubscriptionTier::FreeTeacher => Some(0),
            SubscriptionTier::PremiumStudent | SubscriptionTier::PremiumTeacher => Some(1),
            SubscriptionTier::Personal => Some(2),
            SubscriptionTier::Unknown => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            SubscriptionTier::PremiumStudent
                | SubscriptionTier::PremiumTeacher
                | SubscriptionTier::Personal
        )
    }

    /// The tier a principal holds before any checkout completes.
    pub fn free_for_role(role: Role) -> Option<SubscriptionTier> {
        match role.family()? {
            RoleFamily::Student => Some(SubscriptionTier::FreeStudent),
            RoleFamily::Teacher => Some(SubscriptionTier::FreeTeacher),
            RoleFamily::Personal => None,
        }
    }

    /// Whether this tier meets `minimum` under the family ordering.
    ///
    /// `Personal` sits above both premium plans and satisfies any minimum;
    /// tiers of different families never satisfy each other regardless of
    /// rank. Unknown on either side is a refusal.
    pub fn satisfies(&self, minimum: &SubscriptionTier) -> bool {
        let (Some(rank), Some(min_rank)) = (self.rank(), minimum.rank()) else {
            return false;
        };
        match (self.family(), minimum.family()) {
            (Some(RoleFamily::Personal), Some(_)) => rank >= min_rank,
            (Some(mine), Some(required)) if mine == required => rank >= min_rank,
            _ => false,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTier::FreeStudent => write!(f, "free_student"),
            SubscriptionTier::PremiumStudent => write!(f, "premium_student"),
            SubscriptionTier::FreeTeacher => write!(f, "free_teacher"),
            SubscriptionTier::PremiumTeacher => write!(f, "premium_teacher"),
            SubscriptionTier::Personal => write!(f, "personal"),
            SubscriptionTier::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    PastDue,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Pending => write!(f, "pending"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
            SubscriptionStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Last-known subscription state for one principal.
///
/// The external billing authority is the source of truth; this record is a
/// cache. `version` only ever increases, and every write is conflict-checked
/// against it, so out-of-order confirmation delivery cannot roll state back.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SubscriptionRecord {
    pub principal: PrincipalId,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub external_subscription_id: Option<String>,
    pub version: u64,
    pub last_synced_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// The version-0 record seeded at account creation. `None` when the
    /// role resolves to no family (unrecognized identity data).
    pub fn initial(principal: PrincipalId, role: Role, now: DateTime<Utc>) -> Option<Self> {
        let tier = SubscriptionTier::free_for_role(role)?;
        Some(Self {
            principal,
            tier,
            status: SubscriptionStatus::Active,
            external_subscription_id: None,
            version: 0,
            last_synced_at: now,
        })
    }

    /// Last-writer-wins by version, not wall clock.
    pub fn supersedes(&self, stored: &SubscriptionRecord) -> bool {
        self.version > stored.version
    }
}
