use thiserror::Error;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("billing gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("billing gateway rejected the request: {0}")]
    GatewayRejected(String),
    #[error("reconciliation failed after {attempts} attempts")]
    ReconciliationFailed { attempts: u32 },
    #[error("subscription store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("course not found: {0}")]
    CourseNotFound(String),
    #[error("webhook rejected: {0}")]
    WebhookRejected(String),
    #[error("invalid billing event: {0}")]
    InvalidEvent(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable(_) | Self::StoreUnavailable(_))
    }
}
