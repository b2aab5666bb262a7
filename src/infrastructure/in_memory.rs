//! Thread-safe in-memory adapters for every store port.
//!
//! Each store wraps its map in `Arc<RwLock<…>>` for shared concurrent
//! access. The batch and application stores perform their uniqueness checks
//! under the write lock, so "one non-terminal row per teacher" holds even
//! with overlapping cycle runs.

use crate::domain::application::{ApplicationId, TierApplication};
use crate::domain::earning::{EarningStatus, TeacherEarning};
use crate::domain::lesson::{CompletedLesson, LessonId};
use crate::domain::money::Money;
use crate::domain::notification::Notification;
use crate::domain::payout::{BatchId, BatchStatus, PayoutBatch};
use crate::domain::ports::{
    ApplicationStore, BatchStore, EarningStore, LessonStore, NotificationOutbox, TeacherStore,
    TierHistoryStore,
};
use crate::domain::teacher::{TeacherId, TeacherProfile};
use crate::domain::tier::TierHistoryEntry;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct InMemoryTeacherStore {
    teachers: Arc<RwLock<HashMap<TeacherId, TeacherProfile>>>,
}

impl InMemoryTeacherStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeacherStore for InMemoryTeacherStore {
    async fn get(&self, id: TeacherId) -> Result<Option<TeacherProfile>> {
        let teachers = self.teachers.read().await;
        Ok(teachers.get(&id).cloned())
    }

    async fn upsert(&self, profile: TeacherProfile) -> Result<()> {
        let mut teachers = self.teachers.write().await;
        teachers.insert(profile.id, profile);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<TeacherProfile>> {
        let teachers = self.teachers.read().await;
        let mut all: Vec<TeacherProfile> = teachers.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryLessonStore {
    lessons: Arc<RwLock<HashMap<LessonId, CompletedLesson>>>,
}

impl InMemoryLessonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LessonStore for InMemoryLessonStore {
    async fn record(&self, lesson: CompletedLesson) -> Result<()> {
        let mut lessons = self.lessons.write().await;
        lessons.insert(lesson.lesson_id, lesson);
        Ok(())
    }

    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<CompletedLesson>> {
        let lessons = self.lessons.read().await;
        let mut found: Vec<CompletedLesson> = lessons
            .values()
            .filter(|l| l.teacher_id == teacher_id)
            .cloned()
            .collect();
        found.sort_by_key(|l| l.lesson_id);
        Ok(found)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryEarningStore {
    earnings: Arc<RwLock<HashMap<LessonId, TeacherEarning>>>,
}

impl InMemoryEarningStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EarningStore for InMemoryEarningStore {
    async fn get(&self, lesson_id: LessonId) -> Result<Option<TeacherEarning>> {
        let earnings = self.earnings.read().await;
        Ok(earnings.get(&lesson_id).cloned())
    }

    async fn upsert(&self, earning: TeacherEarning) -> Result<()> {
        let mut earnings = self.earnings.write().await;
        earnings.insert(earning.lesson_id, earning);
        Ok(())
    }

    async fn due_for_clearing(&self, now: DateTime<Utc>) -> Result<Vec<TeacherEarning>> {
        let earnings = self.earnings.read().await;
        let mut due: Vec<TeacherEarning> = earnings
            .values()
            .filter(|e| e.is_due_for_clearing(now))
            .cloned()
            .collect();
        due.sort_by_key(|e| e.lesson_id);
        Ok(due)
    }

    async fn cleared(&self) -> Result<Vec<TeacherEarning>> {
        let earnings = self.earnings.read().await;
        let mut cleared: Vec<TeacherEarning> = earnings
            .values()
            .filter(|e| e.status == EarningStatus::Cleared)
            .cloned()
            .collect();
        cleared.sort_by_key(|e| e.lesson_id);
        Ok(cleared)
    }

    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<TeacherEarning>> {
        let earnings = self.earnings.read().await;
        let mut found: Vec<TeacherEarning> = earnings
            .values()
            .filter(|e| e.teacher_id == teacher_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.lesson_id);
        Ok(found)
    }

    async fn mark_paid(
        &self,
        lesson_ids: &[LessonId],
        batch_id: BatchId,
        paid_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut earnings = self.earnings.write().await;
        // Validate the whole set before mutating anything.
        for lesson_id in lesson_ids {
            let earning = earnings
                .get(lesson_id)
                .ok_or_else(|| LedgerError::NotFound(format!("earning for lesson {lesson_id}")))?;
            if earning.payout_batch_id.is_some() {
                return Err(LedgerError::Conflict(format!(
                    "earning for lesson {lesson_id} already belongs to a batch"
                )));
            }
        }
        for lesson_id in lesson_ids {
            if let Some(earning) = earnings.get_mut(lesson_id) {
                earning.status = EarningStatus::Paid;
                earning.payout_batch_id = Some(batch_id);
                earning.paid_at = Some(paid_at);
            }
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryBatchStore {
    batches: Arc<RwLock<HashMap<BatchId, PayoutBatch>>>,
    next_id: Arc<RwLock<u64>>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn create_processing(
        &self,
        teacher_id: TeacherId,
        total_amount: Money,
        currency: String,
        earning_count: u32,
        created_at: DateTime<Utc>,
    ) -> Result<PayoutBatch> {
        // Check-and-insert under one write lock so two overlapping cycles
        // cannot both create a batch for the same teacher.
        let mut batches = self.batches.write().await;
        if batches
            .values()
            .any(|b| b.teacher_id == teacher_id && !b.status.is_terminal())
        {
            return Err(LedgerError::Conflict(format!(
                "teacher {teacher_id} already has a processing batch"
            )));
        }
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let batch = PayoutBatch {
            id: BatchId(*next_id),
            teacher_id,
            total_amount,
            currency,
            earning_count,
            transfer_ref: None,
            status: BatchStatus::Processing,
            created_at,
            settled_at: None,
        };
        batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn finish(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
        transfer_ref: Option<String>,
        settled_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut batches = self.batches.write().await;
        let batch = batches
            .get_mut(&batch_id)
            .ok_or_else(|| LedgerError::NotFound(format!("batch {batch_id}")))?;
        if batch.status.is_terminal() {
            return Err(LedgerError::Conflict(format!(
                "batch {batch_id} is already settled"
            )));
        }
        batch.status = status;
        batch.transfer_ref = transfer_ref;
        batch.settled_at = Some(settled_at);
        Ok(())
    }

    async fn get(&self, batch_id: BatchId) -> Result<Option<PayoutBatch>> {
        let batches = self.batches.read().await;
        Ok(batches.get(&batch_id).cloned())
    }

    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<PayoutBatch>> {
        let batches = self.batches.read().await;
        let mut found: Vec<PayoutBatch> = batches
            .values()
            .filter(|b| b.teacher_id == teacher_id)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.id);
        Ok(found)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    applications: Arc<RwLock<HashMap<ApplicationId, TierApplication>>>,
    next_id: Arc<RwLock<u64>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn create(&self, mut application: TierApplication) -> Result<TierApplication> {
        let mut applications = self.applications.write().await;
        if applications
            .values()
            .any(|a| a.teacher_id == application.teacher_id && !a.status.is_terminal())
        {
            return Err(LedgerError::Conflict(format!(
                "teacher {} already has an open application",
                application.teacher_id
            )));
        }
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        application.id = ApplicationId(*next_id);
        applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn get(&self, id: ApplicationId) -> Result<Option<TierApplication>> {
        let applications = self.applications.read().await;
        Ok(applications.get(&id).cloned())
    }

    async fn update(&self, application: TierApplication) -> Result<()> {
        let mut applications = self.applications.write().await;
        if !applications.contains_key(&application.id) {
            return Err(LedgerError::NotFound(format!(
                "application {}",
                application.id
            )));
        }
        applications.insert(application.id, application);
        Ok(())
    }

    async fn open_for_teacher(&self, teacher_id: TeacherId) -> Result<Option<TierApplication>> {
        let applications = self.applications.read().await;
        Ok(applications
            .values()
            .find(|a| a.teacher_id == teacher_id && !a.status.is_terminal())
            .cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTierHistoryStore {
    entries: Arc<RwLock<Vec<TierHistoryEntry>>>,
}

impl InMemoryTierHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TierHistoryStore for InMemoryTierHistoryStore {
    async fn append(&self, entry: TierHistoryEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn for_teacher(&self, teacher_id: TeacherId) -> Result<Vec<TierHistoryEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.teacher_id == teacher_id)
            .cloned()
            .collect())
    }
}

/// Outbox rows accumulate in memory; tests and the CLI inspect them via
/// [`InMemoryOutbox::drain`].
#[derive(Default, Clone)]
pub struct InMemoryOutbox {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn drain(&self) -> Vec<Notification> {
        let mut notifications = self.notifications.write().await;
        notifications.drain(..).collect()
    }
}

#[async_trait]
impl NotificationOutbox for InMemoryOutbox {
    async fn enqueue(&self, notification: Notification) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        notifications.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_teacher_store_roundtrip() {
        let store = InMemoryTeacherStore::new();
        let profile = TeacherProfile::new(TeacherId(1));
        store.upsert(profile.clone()).await.unwrap();

        assert_eq!(store.get(TeacherId(1)).await.unwrap(), Some(profile));
        assert!(store.get(TeacherId(2)).await.unwrap().is_none());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_store_rejects_second_processing_batch() {
        let store = InMemoryBatchStore::new();
        let now = Utc::now();
        let first = store
            .create_processing(TeacherId(1), Money::new(dec!(10.0)), "GBP".into(), 2, now)
            .await
            .unwrap();

        let second = store
            .create_processing(TeacherId(1), Money::new(dec!(5.0)), "GBP".into(), 1, now)
            .await;
        assert!(matches!(second, Err(LedgerError::Conflict(_))));

        // Another teacher is unaffected.
        store
            .create_processing(TeacherId(2), Money::new(dec!(5.0)), "GBP".into(), 1, now)
            .await
            .unwrap();

        // Once the first batch is terminal a new one is allowed.
        store
            .finish(first.id, BatchStatus::Completed, Some("tr_1".into()), now)
            .await
            .unwrap();
        store
            .create_processing(TeacherId(1), Money::new(dec!(5.0)), "GBP".into(), 1, now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_finish_is_single_shot() {
        let store = InMemoryBatchStore::new();
        let now = Utc::now();
        let batch = store
            .create_processing(TeacherId(1), Money::new(dec!(10.0)), "GBP".into(), 1, now)
            .await
            .unwrap();
        store
            .finish(batch.id, BatchStatus::Completed, Some("tr_1".into()), now)
            .await
            .unwrap();

        let again = store
            .finish(
                batch.id,
                BatchStatus::Failed {
                    reason: "late".into(),
                },
                None,
                now,
            )
            .await;
        assert!(matches!(again, Err(LedgerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_application_store_single_open_application() {
        use crate::domain::application::{ApplicationEvidence, ApplicationStatus};
        use crate::domain::tier::TierLevel;

        let store = InMemoryApplicationStore::new();
        let template = TierApplication {
            id: ApplicationId(0),
            teacher_id: TeacherId(1),
            requested_tier: TierLevel::Expert,
            evidence: ApplicationEvidence {
                statement: "evidence".into(),
                declares_language_proficiency: true,
            },
            status: ApplicationStatus::UnderReview,
            review_notes: None,
            granted_rate: None,
            submitted_at: Utc::now(),
            decided_at: None,
        };

        let created = store.create(template.clone()).await.unwrap();
        assert_eq!(created.id, ApplicationId(1));
        assert!(matches!(
            store.create(template.clone()).await,
            Err(LedgerError::Conflict(_))
        ));

        // Terminalize, then a fresh application is accepted.
        let mut decided = created.clone();
        decided.status = ApplicationStatus::Rejected;
        store.update(decided).await.unwrap();
        assert!(store
            .open_for_teacher(TeacherId(1))
            .await
            .unwrap()
            .is_none());
        store.create(template).await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_paid_refuses_rebatching() {
        use crate::domain::earning::TeacherEarning;
        use crate::domain::money::Rate;

        let store = InMemoryEarningStore::new();
        let now = Utc::now();
        let earning = TeacherEarning::record(
            LessonId(1),
            TeacherId(1),
            60,
            now,
            Rate::new(dec!(8.0)).unwrap(),
            Rate::new(dec!(12.5)).unwrap(),
            "GBP".into(),
            0,
            now,
        );
        store.upsert(earning).await.unwrap();

        store
            .mark_paid(&[LessonId(1)], BatchId(1), now)
            .await
            .unwrap();
        let paid = store.get(LessonId(1)).await.unwrap().unwrap();
        assert_eq!(paid.status, EarningStatus::Paid);
        assert_eq!(paid.payout_batch_id, Some(BatchId(1)));

        assert!(matches!(
            store.mark_paid(&[LessonId(1)], BatchId(2), now).await,
            Err(LedgerError::Conflict(_))
        ));
        let unchanged = store.get(LessonId(1)).await.unwrap().unwrap();
        assert_eq!(unchanged.payout_batch_id, Some(BatchId(1)));
    }
}
