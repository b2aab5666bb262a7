use super::application::TierApplication;
use super::earning::TeacherEarning;
use super::application::ApplicationId;
use super::lesson::{CompletedLesson, LessonId};
use super::money::Money;
use super::notification::Notification;
use super::payout::{BatchId, BatchStatus, PayoutBatch, TransferId, TransferRequest};
use super::teacher::{TeacherId, TeacherProfile};
use super::tier::TierHistoryEntry;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type TeacherStoreRef = Arc<dyn TeacherStore>;
pub type LessonStoreRef = Arc<dyn LessonStore>;
pub type EarningStoreRef = Arc<dyn EarningStore>;
pub type BatchStoreRef = Arc<dyn BatchStore>;
pub type ApplicationStoreRef = Arc<dyn ApplicationStore>;
pub type TierHistoryStoreRef = Arc<dyn TierHistoryStore>;
pub type PaymentRailRef = Arc<dyn PaymentRail>;
pub type NotificationOutboxRef = Arc<dyn NotificationOutbox>;

#[async_trait]
pub trait TeacherStore: Send + Sync {
    async fn get(&self, id: TeacherId) -> Result<Option<TeacherProfile>>;
    async fn upsert(&self, profile: TeacherProfile) -> Result<()>;
    async fn all(&self) -> Result<Vec<TeacherProfile>>;
}

#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Idempotent on lesson id.
    async fn record(&self, lesson: CompletedLesson) -> Result<()>;
    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<CompletedLesson>>;
}

#[async_trait]
pub trait EarningStore: Send + Sync {
    async fn get(&self, lesson_id: LessonId) -> Result<Option<TeacherEarning>>;
    async fn upsert(&self, earning: TeacherEarning) -> Result<()>;
    /// Held earnings whose clearing time has passed.
    async fn due_for_clearing(&self, now: DateTime<Utc>) -> Result<Vec<TeacherEarning>>;
    /// All cleared earnings, the settlement cycle's input.
    async fn cleared(&self) -> Result<Vec<TeacherEarning>>;
    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<TeacherEarning>>;
    /// Marks every listed earning paid and links it to the batch. Fails with
    /// `Conflict` if any earning is already linked to a batch; a batch id is
    /// set exactly once.
    async fn mark_paid(
        &self,
        lesson_ids: &[LessonId],
        batch_id: BatchId,
        paid_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Conditional insert: fails with `Conflict` while another non-terminal
    /// batch exists for the teacher. This is the hard settlement guard; it
    /// must be atomic with respect to concurrent cycle runs.
    async fn create_processing(
        &self,
        teacher_id: TeacherId,
        total_amount: Money,
        currency: String,
        earning_count: u32,
        created_at: DateTime<Utc>,
    ) -> Result<PayoutBatch>;
    async fn finish(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
        transfer_ref: Option<String>,
        settled_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn get(&self, batch_id: BatchId) -> Result<Option<PayoutBatch>>;
    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<PayoutBatch>>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Conditional insert: fails with `Conflict` while the teacher already
    /// has a non-terminal application.
    async fn create(&self, application: TierApplication) -> Result<TierApplication>;
    async fn get(&self, id: ApplicationId) -> Result<Option<TierApplication>>;
    async fn update(&self, application: TierApplication) -> Result<()>;
    async fn open_for_teacher(&self, teacher_id: TeacherId) -> Result<Option<TierApplication>>;
}

#[async_trait]
pub trait TierHistoryStore: Send + Sync {
    async fn append(&self, entry: TierHistoryEntry) -> Result<()>;
    /// Entries for one teacher in chronological order.
    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<TierHistoryEntry>>;
}

/// External payment rail. Assumed idempotent given the same key; callers
/// always supply one and bound the call with a timeout.
#[async_trait]
pub trait PaymentRail: Send + Sync {
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferId>;
}

/// Outbound notification queue. Best effort; never gates a financial
/// transition.
#[async_trait]
pub trait NotificationOutbox: Send + Sync {
    async fn enqueue(&self, notification: Notification) -> Result<()>;
}
