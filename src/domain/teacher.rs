use super::tier::TierLevel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeacherId(pub u32);

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Retention measurement for a teacher.
///
/// Below the configured sample floor the value is a sentinel rather than a
/// number, so low-volume teachers are never gated on a meaningless ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionSample {
    InsufficientSample { students: u32 },
    Measured { rate: f64, students: u32 },
}

impl RetentionSample {
    pub fn rate(&self) -> Option<f64> {
        match self {
            RetentionSample::Measured { rate, .. } => Some(*rate),
            RetentionSample::InsufficientSample { .. } => None,
        }
    }

    pub fn students(&self) -> u32 {
        match self {
            RetentionSample::Measured { students, .. }
            | RetentionSample::InsufficientSample { students } => *students,
        }
    }
}

impl Default for RetentionSample {
    fn default() -> Self {
        RetentionSample::InsufficientSample { students: 0 }
    }
}

/// A teacher's current tier and the cached metrics tier evaluation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: TeacherId,
    pub current_tier: TierLevel,
    /// Derived from completed lessons; refreshed on every ingested lesson.
    pub hours_taught: Decimal,
    pub completed_lessons: u32,
    pub average_rating: f64,
    pub retention: RetentionSample,
    /// Set by a manual tier assignment; disables auto re-evaluation.
    pub manual_override: bool,
    /// Verified payment-rail destination. Teachers without one are skipped
    /// by the settlement cycle.
    pub payout_account: Option<String>,
}

impl TeacherProfile {
    pub fn new(id: TeacherId) -> Self {
        Self {
            id,
            current_tier: TierLevel::Newcomer,
            hours_taught: Decimal::ZERO,
            completed_lessons: 0,
            average_rating: 0.0,
            retention: RetentionSample::default(),
            manual_override: false,
            payout_account: None,
        }
    }

    pub fn with_payout_account(mut self, account: impl Into<String>) -> Self {
        self.payout_account = Some(account.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = TeacherProfile::new(TeacherId(7));
        assert_eq!(profile.current_tier, TierLevel::Newcomer);
        assert_eq!(profile.completed_lessons, 0);
        assert_eq!(
            profile.retention,
            RetentionSample::InsufficientSample { students: 0 }
        );
        assert!(!profile.manual_override);
        assert!(profile.payout_account.is_none());
    }

    #[test]
    fn test_retention_sample_accessors() {
        let measured = RetentionSample::Measured {
            rate: 0.72,
            students: 12,
        };
        assert_eq!(measured.rate(), Some(0.72));
        assert_eq!(measured.students(), 12);

        let sentinel = RetentionSample::InsufficientSample { students: 3 };
        assert_eq!(sentinel.rate(), None);
        assert_eq!(sentinel.students(), 3);
    }
}
