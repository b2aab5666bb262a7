use super::money::Rate;
use super::teacher::TeacherId;
use super::tier::TierLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Supporting evidence supplied with a top-tier application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEvidence {
    pub statement: String,
    /// Self-declared language proficiency; pre-screened, verified by a
    /// human reviewer.
    pub declares_language_proficiency: bool,
}

/// Manual-review request for a top tier. At most one non-terminal
/// application exists per teacher; the store enforces this on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierApplication {
    pub id: ApplicationId,
    pub teacher_id: TeacherId,
    pub requested_tier: TierLevel,
    pub evidence: ApplicationEvidence,
    pub status: ApplicationStatus,
    /// Why the application is still `Pending`, or the reviewer's notes once
    /// decided.
    pub review_notes: Option<String>,
    /// Teacher hourly rate stamped when the application is approved.
    pub granted_rate: Option<Rate>,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}
