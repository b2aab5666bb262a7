use super::teacher::TeacherId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LessonId(pub u64);

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub u32);

/// Lesson-completion event from the booking collaborator.
///
/// Delivery may be duplicated upstream; everything consuming this event is
/// idempotent on `lesson_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedLesson {
    pub lesson_id: LessonId,
    pub teacher_id: TeacherId,
    pub student_id: StudentId,
    pub duration_minutes: u32,
    pub scheduled_time: DateTime<Utc>,
}
