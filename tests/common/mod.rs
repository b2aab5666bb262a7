#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tutorpay::application::applications::ApplicationWorkflow;
use tutorpay::application::ledger::EarningsLedger;
use tutorpay::application::retention::RetentionCalculator;
use tutorpay::application::settlement::SettlementProcessor;
use tutorpay::application::tiers::TierEngine;
use tutorpay::config::LedgerConfig;
use tutorpay::domain::lesson::{CompletedLesson, LessonId, StudentId};
use tutorpay::domain::payout::{TransferId, TransferRequest};
use tutorpay::domain::ports::{
    ApplicationStoreRef, BatchStoreRef, EarningStoreRef, LessonStoreRef, PaymentRail,
    PaymentRailRef, TeacherStoreRef, TierHistoryStoreRef,
};
use tutorpay::domain::teacher::{RetentionSample, TeacherId, TeacherProfile};
use tutorpay::domain::tier::{TierLevel, TierRegistry};
use tutorpay::error::{LedgerError, Result};
use tutorpay::infrastructure::in_memory::{
    InMemoryApplicationStore, InMemoryBatchStore, InMemoryEarningStore, InMemoryLessonStore,
    InMemoryOutbox, InMemoryTeacherStore, InMemoryTierHistoryStore,
};

/// Shared wiring for engine-level tests: every store plus the standard
/// registry and a default config.
pub struct TestEnv {
    pub teachers: TeacherStoreRef,
    pub lessons: LessonStoreRef,
    pub earnings: EarningStoreRef,
    pub batches: BatchStoreRef,
    pub applications: ApplicationStoreRef,
    pub history: TierHistoryStoreRef,
    pub outbox: Arc<InMemoryOutbox>,
    pub registry: Arc<TierRegistry>,
    pub config: LedgerConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            teachers: Arc::new(InMemoryTeacherStore::new()),
            lessons: Arc::new(InMemoryLessonStore::new()),
            earnings: Arc::new(InMemoryEarningStore::new()),
            batches: Arc::new(InMemoryBatchStore::new()),
            applications: Arc::new(InMemoryApplicationStore::new()),
            history: Arc::new(InMemoryTierHistoryStore::new()),
            outbox: Arc::new(InMemoryOutbox::new()),
            registry: Arc::new(TierRegistry::standard()),
            config: LedgerConfig::default(),
        }
    }

    pub fn ledger(&self) -> EarningsLedger {
        EarningsLedger::new(
            self.teachers.clone(),
            self.lessons.clone(),
            self.earnings.clone(),
            self.registry.clone(),
            self.config.clone(),
        )
    }

    pub fn settlement(&self, rail: PaymentRailRef) -> SettlementProcessor {
        SettlementProcessor::new(
            self.teachers.clone(),
            self.earnings.clone(),
            self.batches.clone(),
            rail,
            self.outbox.clone(),
            self.config.clone(),
        )
    }

    pub fn tiers(&self) -> Arc<TierEngine> {
        Arc::new(TierEngine::new(
            self.teachers.clone(),
            self.history.clone(),
            self.applications.clone(),
            self.registry.clone(),
            self.outbox.clone(),
        ))
    }

    pub fn workflow(&self) -> ApplicationWorkflow {
        ApplicationWorkflow::new(
            self.teachers.clone(),
            self.applications.clone(),
            self.registry.clone(),
            self.outbox.clone(),
            self.tiers(),
        )
    }

    pub fn retention(&self) -> RetentionCalculator {
        RetentionCalculator::new(
            self.teachers.clone(),
            self.lessons.clone(),
            self.config.clone(),
        )
    }

    /// Inserts a teacher with the given tier and metrics, plus a verified
    /// payout account.
    pub async fn add_teacher(
        &self,
        id: u32,
        tier: TierLevel,
        hours: Decimal,
        rating: f64,
        retention: RetentionSample,
    ) -> TeacherProfile {
        let profile = TeacherProfile {
            id: TeacherId(id),
            current_tier: tier,
            hours_taught: hours,
            completed_lessons: 0,
            average_rating: rating,
            retention,
            manual_override: false,
            payout_account: Some(format!("acct_{id}")),
        };
        self.teachers
            .upsert(profile.clone())
            .await
            .expect("store teacher");
        profile
    }
}

pub fn date(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("valid RFC 3339 timestamp")
}

pub fn lesson(
    lesson_id: u64,
    teacher_id: u32,
    student_id: u32,
    duration_minutes: u32,
    scheduled_time: &str,
) -> CompletedLesson {
    CompletedLesson {
        lesson_id: LessonId(lesson_id),
        teacher_id: TeacherId(teacher_id),
        student_id: StudentId(student_id),
        duration_minutes,
        scheduled_time: date(scheduled_time),
    }
}

/// Payment rail double that records every request and fails configured
/// destination accounts.
#[derive(Default)]
pub struct ScriptedRail {
    calls: Mutex<Vec<TransferRequest>>,
    failing: Mutex<HashSet<String>>,
}

impl ScriptedRail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_destination(&self, account: &str) {
        self.failing.lock().unwrap().insert(account.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<TransferRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentRail for ScriptedRail {
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferId> {
        self.calls.lock().unwrap().push(request.clone());
        if self
            .failing
            .lock()
            .unwrap()
            .contains(&request.destination_account)
        {
            return Err(LedgerError::PaymentRail(
                "rail rejected transfer".to_string(),
            ));
        }
        Ok(TransferId(format!("tr_{}", request.idempotency_key)))
    }
}
