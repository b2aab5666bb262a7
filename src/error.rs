use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy for the earnings ledger.
///
/// `Validation` and `NotFound` reject a request before anything is written.
/// `Conflict` marks a rejected state transition (e.g. a backward earning
/// status change or a second in-flight payout batch) that callers usually
/// treat as a skip rather than a failure. `PaymentRail` failures are isolated
/// per teacher; `Storage` failures are fatal for the whole operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payment rail error: {0}")]
    PaymentRail(String),
    #[error("datastore unavailable: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Conflict(_))
    }
}
