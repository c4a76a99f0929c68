use super::principal::Role;
use super::subscription::SubscriptionTier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CourseCategory {
    Coding,
    Ai,
    Cybersecurity,
    Design,
    Business,
    #[serde(other)]
    Unknown,
}

/// Catalog entry the engine decides access for. Read-only here; the catalog
/// collaborator owns the data.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Course {
    pub id: String,
    pub category: CourseCategory,
    /// Lowest tier that unlocks the course. `None` means the course is open
    /// to any authenticated principal that passes the audience gate.
    pub minimum_tier: Option<SubscriptionTier>,
    /// Role the course is restricted to. `None` means any role.
    pub audience: Option<Role>,
}

impl Course {
    pub fn new(id: impl Into<String>, category: CourseCategory) -> Self {
        Self {
            id: id.into(),
            category,
            minimum_tier: None,
            audience: None,
        }
    }

    pub fn with_minimum_tier(mut self, tier: SubscriptionTier) -> Self {
        self.minimum_tier = Some(tier);
        self
    }

    pub fn with_audience(mut self, role: Role) -> Self {
        self.audience = Some(role);
        self
    }
}
