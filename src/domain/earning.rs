use super::lesson::LessonId;
use super::money::{Money, Rate};
use super::payout::BatchId;
use super::teacher::TeacherId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Earning lifecycle. The ordering is the allowed direction of travel;
/// transitions that would move left are conflicts, never applied.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EarningStatus {
    Held,
    Cleared,
    Paid,
}

/// One earning per completed lesson, keyed by lesson id.
///
/// Created exactly once, mutated only by status-advancing operations, never
/// deleted. The rate pair is snapshotted at creation so a later tier change
/// never rewrites what a finished lesson pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherEarning {
    pub lesson_id: LessonId,
    pub teacher_id: TeacherId,
    pub amount_earned: Money,
    pub platform_fee: Money,
    pub total_cost: Money,
    /// Teacher hourly rate in effect when the earning was first recorded.
    pub hourly_rate: Rate,
    /// Student hourly price in effect when the earning was first recorded.
    pub hourly_price: Rate,
    pub currency: String,
    pub status: EarningStatus,
    pub completed_at: DateTime<Utc>,
    pub hold_period_days: i64,
    pub clear_at: DateTime<Utc>,
    /// Set exactly once, when the earning is paid; never overwritten.
    pub payout_batch_id: Option<BatchId>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl TeacherEarning {
    /// Prices a new earning from the rate pair and assigns its initial
    /// status: cleared immediately when the hold window has already elapsed,
    /// otherwise held until `clear_at`.
    pub fn record(
        lesson_id: LessonId,
        teacher_id: TeacherId,
        duration_minutes: u32,
        completed_at: DateTime<Utc>,
        rate: Rate,
        price: Rate,
        currency: String,
        hold_period_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let amount_earned = rate.for_minutes(duration_minutes);
        let total_cost = price.for_minutes(duration_minutes);
        let clear_at = completed_at + Duration::days(hold_period_days);
        let status = if now >= clear_at {
            EarningStatus::Cleared
        } else {
            EarningStatus::Held
        };
        Self {
            lesson_id,
            teacher_id,
            amount_earned,
            platform_fee: total_cost - amount_earned,
            total_cost,
            hourly_rate: rate,
            hourly_price: price,
            currency,
            status,
            completed_at,
            hold_period_days,
            clear_at,
            payout_batch_id: None,
            paid_at: None,
        }
    }

    /// Re-prices the money fields from the snapshotted rates. Used when a
    /// duplicate lesson event arrives with a corrected duration; status and
    /// clearing schedule are untouched.
    pub fn reprice(&mut self, duration_minutes: u32) {
        self.amount_earned = self.hourly_rate.for_minutes(duration_minutes);
        self.total_cost = self.hourly_price.for_minutes(duration_minutes);
        self.platform_fee = self.total_cost - self.amount_earned;
    }

    pub fn is_due_for_clearing(&self, now: DateTime<Utc>) -> bool {
        self.status == EarningStatus::Held && now >= self.clear_at
    }
}
