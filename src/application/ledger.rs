use crate::config::LedgerConfig;
use crate::domain::earning::{EarningStatus, TeacherEarning};
use crate::domain::lesson::CompletedLesson;
use crate::domain::ports::{EarningStoreRef, LessonStoreRef, TeacherStoreRef};
use crate::domain::tier::TierRegistry;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// What `record_earning` did with an incoming lesson event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    /// Duplicate delivery against a held earning; money fields re-priced
    /// from the snapshotted rates.
    Updated,
    /// Duplicate delivery for a cleared or paid earning; logged and dropped.
    Conflict,
}

/// Converts completed lessons into earnings and advances them through the
/// hold window.
pub struct EarningsLedger {
    teachers: TeacherStoreRef,
    lessons: LessonStoreRef,
    earnings: EarningStoreRef,
    registry: Arc<TierRegistry>,
    config: LedgerConfig,
}

impl EarningsLedger {
    pub fn new(
        teachers: TeacherStoreRef,
        lessons: LessonStoreRef,
        earnings: EarningStoreRef,
        registry: Arc<TierRegistry>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            teachers,
            lessons,
            earnings,
            registry,
            config,
        }
    }

    /// Records one earning for a completed lesson. Idempotent on lesson id.
    ///
    /// The teacher's tier rates are captured on first sight and stored on
    /// the earning; replays re-price from that snapshot, so a promotion
    /// between delivery attempts never changes what the lesson pays.
    /// Re-pricing stops once the earning leaves the hold window: a cleared
    /// amount may already be counted into a payout batch total, so a replay
    /// against a cleared or paid earning is a conflict no-op, not an error.
    pub async fn record_earning(
        &self,
        lesson: &CompletedLesson,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let mut profile = self
            .teachers
            .get(lesson.teacher_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("teacher {}", lesson.teacher_id)))?;

        if let Some(mut existing) = self.earnings.get(lesson.lesson_id).await? {
            if existing.status > EarningStatus::Held {
                warn!(
                    lesson = %lesson.lesson_id,
                    status = ?existing.status,
                    "conflicting replay for a released earning, ignoring"
                );
                return Ok(RecordOutcome::Conflict);
            }
            existing.reprice(lesson.duration_minutes);
            self.earnings.upsert(existing).await?;
            debug!(lesson = %lesson.lesson_id, "duplicate lesson event re-priced");
            return Ok(RecordOutcome::Updated);
        }

        let tier = self.registry.get(profile.current_tier)?;
        let earning = TeacherEarning::record(
            lesson.lesson_id,
            lesson.teacher_id,
            lesson.duration_minutes,
            lesson.scheduled_time,
            tier.teacher_hourly_rate,
            tier.student_hourly_price,
            self.config.currency.clone(),
            self.config.hold_period_days,
            now,
        );
        self.earnings.upsert(earning).await?;
        self.lessons.record(lesson.clone()).await?;

        // Refresh the cached lesson metrics on the profile.
        profile.completed_lessons += 1;
        profile.hours_taught += Decimal::from(lesson.duration_minutes) / Decimal::from(60);
        self.teachers.upsert(profile).await?;

        Ok(RecordOutcome::Created)
    }

    /// Releases held earnings whose hold window has elapsed. A pure status
    /// transition; no monetary field is recomputed. Returns the number of
    /// earnings cleared.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.earnings.due_for_clearing(now).await?;
        let released = due.len();
        for mut earning in due {
            earning.status = EarningStatus::Cleared;
            self.earnings.upsert(earning).await?;
        }
        if released > 0 {
            debug!(released, "hold sweep released earnings");
        }
        Ok(released)
    }
}
