//! Pure access policy: maps (role, tier, course) to a decision.
//!
//! No I/O, no mutable state. Role gates evaluate strictly before tier gates,
//! so a tier purchased in one family can never leak into another family's
//! content. Unrecognized roles and tiers deny instead of panicking; they are
//! a data-integrity symptom, not a fatal condition.

use super::course::Course;
use super::principal::Role;
use super::subscription::SubscriptionTier;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decision {
    Granted,
    Denied(DenialReason),
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DenialReason {
    /// The caller's role is not a recognized value.
    UnrecognizedRole,
    /// The caller's tier is not a recognized value.
    UnrecognizedTier,
    /// The course's audience excludes the caller's role.
    RoleGate,
    /// Same family, but the tier sits below the course minimum.
    TierBelowMinimum,
    /// The tier belongs to a different family than the course minimum.
    TierFamilyMismatch,
}

/// Evaluate access for one (role, tier, course) triple.
///
/// Deterministic and side-effect free; safe to call concurrently from any
/// number of callers without synchronization.
pub fn evaluate(role: Role, tier: SubscriptionTier, course: &Course) -> Decision {
    if role == Role::Unknown {
        return Decision::Denied(DenialReason::UnrecognizedRole);
    }

    // Role gate first.
    if let Some(audience) = course.audience {
        if audience == Role::Unknown {
            // Malformed catalog row; nobody passes, admins included.
            return Decision::Denied(DenialReason::RoleGate);
        }
        if role != Role::Admin && role != audience {
            return Decision::Denied(DenialReason::RoleGate);
        }
    }

    // Tier gate second. No minimum means any authenticated principal.
    let Some(minimum) = &course.minimum_tier else {
        return Decision::Granted;
    };
    if tier == SubscriptionTier::Unknown {
        return Decision::Denied(DenialReason::UnrecognizedTier);
    }
    if tier.satisfies(minimum) {
        Decision::Granted
    } else if tier.family() == minimum.family() {
        Decision::Denied(DenialReason::TierBelowMinimum)
    } else {
        Decision::Denied(DenialReason::TierFamilyMismatch)
    }
}
