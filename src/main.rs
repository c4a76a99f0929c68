use clap::Parser;
use classgate::application::reconciliation::ReconciliationService;
use classgate::domain::ports::{BillingGatewayRef, SubscriptionStoreRef};
use classgate::infrastructure::in_memory::{
    InMemoryIdentityProvider, InMemorySubscriptionStore, OfflineGateway,
};
use classgate::interfaces::csv::event_reader::{BillingEvent, EventReader};
use classgate::interfaces::csv::record_writer::RecordWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input billing events CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = open_store(cli.db_path)?;

    let identity = Arc::new(InMemoryIdentityProvider::new());
    // Replay never contacts the payment provider; confirmations come from
    // the event stream itself.
    let gateway: BillingGatewayRef = Arc::new(OfflineGateway);
    let service = ReconciliationService::new(store.clone(), gateway, identity.clone());

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                if let Err(e) = replay(&service, &identity, event).await {
                    eprintln!("Error processing event: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {}", e);
            }
        }
    }

    // Final cache state to stdout.
    let records = store.all_records().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());
    writer.write_records(records).into_diagnostic()?;

    Ok(())
}

async fn replay(
    service: &ReconciliationService,
    identity: &Arc<InMemoryIdentityProvider>,
    event: BillingEvent,
) -> classgate::error::Result<()> {
    match event {
        BillingEvent::Register { principal, role } => {
            identity.assign(principal.clone(), role).await;
            service.register_principal(&principal, role).await?;
        }
        BillingEvent::Confirm(record) => {
            // Stale confirmations are a routine replay outcome, not an error.
            service.apply_confirmation(record).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<SubscriptionStoreRef> {
    use classgate::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemorySubscriptionStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<SubscriptionStoreRef> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemorySubscriptionStore::new()))
}
