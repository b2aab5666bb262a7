use super::teacher::TeacherId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PayoutCompleted,
    PayoutFailed,
    TierChanged,
    ApplicationReceived,
}

/// Outbound notification row.
///
/// Appended to an outbox and delivered by a separate consumer; ledger
/// correctness never depends on the downstream service being reachable, so
/// enqueue failures are logged and dropped by every caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: TeacherId,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        recipient: TeacherId,
        payload: serde_json::Value,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            recipient,
            payload,
            enqueued_at,
        }
    }
}
