use crate::domain::principal::{PrincipalId, Role};
use crate::domain::subscription::{
    SubscriptionRecord, SubscriptionStatus, SubscriptionTier,
};
use crate::error::{EngineError, Result};
use chrono::Utc;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Register,
    Confirm,
}

/// Raw CSV row; unused columns stay empty depending on the kind.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct BillingEventRow {
    pub kind: EventKind,
    pub principal: PrincipalId,
    pub role: Option<Role>,
    pub tier: Option<SubscriptionTier>,
    pub status: Option<SubscriptionStatus>,
    pub version: Option<u64>,
    pub external_id: Option<String>,
}

/// A validated billing event ready to replay against the engine.
#[derive(Debug, PartialEq, Clone)]
pub enum BillingEvent {
    Register {
        principal: PrincipalId,
        role: Role,
    },
    Confirm(SubscriptionRecord),
}

impl BillingEventRow {
    fn into_event(self) -> Result<BillingEvent> {
        match self.kind {
            EventKind::Register => {
                let role = self
                    .role
                    .ok_or_else(|| EngineError::InvalidEvent("register row missing role".into()))?;
                Ok(BillingEvent::Register {
                    principal: self.principal,
                    role,
                })
            }
            EventKind::Confirm => {
                let tier = self
                    .tier
                    .ok_or_else(|| EngineError::InvalidEvent("confirm row missing tier".into()))?;
                let status = self.status.ok_or_else(|| {
                    EngineError::InvalidEvent("confirm row missing status".into())
                })?;
                let version = self.version.ok_or_else(|| {
                    EngineError::InvalidEvent("confirm row missing version".into())
                })?;
                Ok(BillingEvent::Confirm(SubscriptionRecord {
                    principal: self.principal,
                    tier,
                    status,
                    external_subscription_id: self.external_id,
                    version,
                    last_synced_at: Utc::now(),
                }))
            }
        }
    }
}

/// Reads billing events from a CSV source.
///
/// Wraps `csv::Reader` and yields an iterator over `Result<BillingEvent>`,
/// handling whitespace trimming and flexible record lengths. Malformed rows
/// surface as errors without stopping the stream.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and validates events.
    pub fn events(self) -> impl Iterator<Item = Result<BillingEvent>> {
        self.reader
            .into_deserialize::<BillingEventRow>()
            .map(|result| result.map_err(EngineError::from).and_then(BillingEventRow::into_event))
    }
}
