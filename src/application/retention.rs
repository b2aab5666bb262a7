use crate::config::LedgerConfig;
use crate::domain::ports::{LessonStoreRef, TeacherStoreRef};
use crate::domain::teacher::{RetentionSample, TeacherId};
use crate::error::{LedgerError, Result};
use std::collections::HashMap;

/// Derives a teacher's retention rate from their lesson history.
///
/// Retention is the fraction of distinct students who came back for a second
/// or further lesson. Below the configured sample floor the profile gets the
/// insufficient-sample sentinel instead of a number.
pub struct RetentionCalculator {
    teachers: TeacherStoreRef,
    lessons: LessonStoreRef,
    config: LedgerConfig,
}

impl RetentionCalculator {
    pub fn new(teachers: TeacherStoreRef, lessons: LessonStoreRef, config: LedgerConfig) -> Self {
        Self {
            teachers,
            lessons,
            config,
        }
    }

    /// Recomputes retention for one teacher and writes it back to the
    /// profile. Returns the sample that was written.
    pub async fn recalculate(&self, teacher_id: TeacherId) -> Result<RetentionSample> {
        let mut profile = self
            .teachers
            .get(teacher_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("teacher {teacher_id}")))?;

        let mut lessons_per_student: HashMap<_, u32> = HashMap::new();
        for lesson in self.lessons.for_teacher(teacher_id).await? {
            *lessons_per_student.entry(lesson.student_id).or_default() += 1;
        }

        let total = lessons_per_student.len() as u32;
        let sample = if total < self.config.min_students_for_retention {
            RetentionSample::InsufficientSample { students: total }
        } else {
            let returning = lessons_per_student.values().filter(|&&n| n >= 2).count() as u32;
            let rate = (returning as f64 / total as f64 * 100.0).round() / 100.0;
            RetentionSample::Measured {
                rate,
                students: total,
            }
        };

        profile.retention = sample;
        self.teachers.upsert(profile).await?;
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lesson::{CompletedLesson, LessonId, StudentId};
    use crate::domain::ports::{LessonStore, TeacherStore};
    use crate::domain::teacher::TeacherProfile;
    use crate::infrastructure::in_memory::{InMemoryLessonStore, InMemoryTeacherStore};
    use chrono::Utc;
    use std::sync::Arc;

    async fn setup(lesson_counts: &[(u32, u32)]) -> (RetentionCalculator, TeacherStoreRef) {
        let teachers = Arc::new(InMemoryTeacherStore::new());
        let lessons = Arc::new(InMemoryLessonStore::new());
        teachers
            .upsert(TeacherProfile::new(TeacherId(1)))
            .await
            .unwrap();

        let mut lesson_id = 0u64;
        for &(student, count) in lesson_counts {
            for _ in 0..count {
                lesson_id += 1;
                lessons
                    .record(CompletedLesson {
                        lesson_id: LessonId(lesson_id),
                        teacher_id: TeacherId(1),
                        student_id: StudentId(student),
                        duration_minutes: 60,
                        scheduled_time: Utc::now(),
                    })
                    .await
                    .unwrap();
            }
        }

        let teachers_ref: TeacherStoreRef = teachers;
        let calc = RetentionCalculator::new(
            teachers_ref.clone(),
            lessons,
            LedgerConfig::default().with_min_students_for_retention(5),
        );
        (calc, teachers_ref)
    }

    #[tokio::test]
    async fn test_small_sample_writes_sentinel() {
        let (calc, teachers) = setup(&[(1, 3), (2, 1), (3, 1)]).await;
        let sample = calc.recalculate(TeacherId(1)).await.unwrap();
        assert_eq!(sample, RetentionSample::InsufficientSample { students: 3 });

        let profile = teachers.get(TeacherId(1)).await.unwrap().unwrap();
        assert_eq!(profile.retention, sample);
    }

    #[tokio::test]
    async fn test_measured_rate_counts_returning_students() {
        // 6 distinct students, 4 of them taught twice or more.
        let (calc, _) = setup(&[(1, 2), (2, 3), (3, 2), (4, 5), (5, 1), (6, 1)]).await;
        let sample = calc.recalculate(TeacherId(1)).await.unwrap();
        assert_eq!(
            sample,
            RetentionSample::Measured {
                rate: 0.67,
                students: 6
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_teacher_is_not_found() {
        let (calc, _) = setup(&[]).await;
        assert!(matches!(
            calc.recalculate(TeacherId(99)).await,
            Err(LedgerError::NotFound(_))
        ));
    }
}
