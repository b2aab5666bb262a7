use super::money::Money;
use super::teacher::TeacherId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Processing,
    Completed,
    Failed { reason: String },
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Processing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed { .. } => "failed",
        }
    }
}

/// One settlement attempt for one teacher.
///
/// Created in `Processing` before the rail is called, so a crash mid-cycle
/// leaves an inspectable record instead of silent money movement. A failed
/// batch leaves its earnings cleared for the next cycle to retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutBatch {
    pub id: BatchId,
    pub teacher_id: TeacherId,
    pub total_amount: Money,
    pub currency: String,
    pub earning_count: u32,
    pub transfer_ref: Option<String>,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl PayoutBatch {
    /// Correlation/idempotency key supplied to the payment rail, so a
    /// retried call for the same batch can never move money twice.
    pub fn idempotency_key(&self) -> String {
        format!("payout-batch-{}", self.id)
    }
}

/// Transfer request handed to the payment rail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub amount: Money,
    pub currency: String,
    pub destination_account: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferId(pub String);

/// Totals returned by one settlement cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CycleSummary {
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub total_transferred: Money,
}
