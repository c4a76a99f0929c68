use crate::domain::ports::{CasOutcome, SubscriptionStore};
use crate::domain::principal::PrincipalId;
use crate::domain::subscription::SubscriptionRecord;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for subscription records, keyed by principal.
pub const CF_SUBSCRIPTIONS: &str = "subscriptions";

/// A persistent subscription store backed by RocksDB.
///
/// Records are stored as JSON rows keyed by principal id. RocksDB offers no
/// native compare-and-swap, so writes serialize through a single async gate
/// while reads go straight to the database; contention is per-deployment
/// rare since updates are per-principal and infrequent.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the subscriptions column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_subscriptions = ColumnFamilyDescriptor::new(CF_SUBSCRIPTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_subscriptions])
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    fn read_record(&self, principal: &PrincipalId) -> Result<Option<SubscriptionRecord>> {
        let cf = self
            .db
            .cf_handle(CF_SUBSCRIPTIONS)
            .ok_or_else(|| EngineError::StoreUnavailable("subscriptions column family not found".into()))?;

        let result = self
            .db
            .get_cf(&cf, principal.as_str())
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        match result {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(|e| {
                    EngineError::StoreUnavailable(format!("corrupt subscription row: {e}"))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SubscriptionStore for RocksDBStore {
    async fn get(&self, principal: &PrincipalId) -> Result<Option<SubscriptionRecord>> {
        self.read_record(principal)
    }

    async fn compare_and_swap(
        &self,
        expected_version: Option<u64>,
        record: SubscriptionRecord,
    ) -> Result<CasOutcome> {
        let _gate = self.write_gate.lock().await;

        let current = self.read_record(&record.principal)?.map(|r| r.version);
        if current != expected_version {
            return Ok(CasOutcome::Conflict);
        }

        let cf = self
            .db
            .cf_handle(CF_SUBSCRIPTIONS)
            .ok_or_else(|| EngineError::StoreUnavailable("subscriptions column family not found".into()))?;
        let value = serde_json::to_vec(&record)
            .map_err(|e| EngineError::StoreUnavailable(format!("serialization error: {e}")))?;
        self.db
            .put_cf(&cf, record.principal.as_str(), value)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(CasOutcome::Committed)
    }

    async fn all_records(&self) -> Result<Vec<SubscriptionRecord>> {
        let cf = self
            .db
            .cf_handle(CF_SUBSCRIPTIONS)
            .ok_or_else(|| EngineError::StoreUnavailable("subscriptions column family not found".into()))?;

        let mut records = Vec::new();
        let iter = self.db.iterator_cf(cf, rocksdb::IteratorMode::Start);
        for item in iter {
            let (_key, value) =
                item.map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            let record: SubscriptionRecord = serde_json::from_slice(&value).map_err(|e| {
                EngineError::StoreUnavailable(format!("corrupt subscription row: {e}"))
            })?;
            records.push(record);
        }
        records.sort_by(|a, b| a.principal.as_str().cmp(b.principal.as_str()));
        Ok(records)
    }
}
