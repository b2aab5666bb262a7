use crate::domain::lesson::CompletedLesson;
use crate::error::LedgerError;
use std::io::Read;

/// Streaming reader for lesson-completion events.
///
/// Rows are yielded one at a time as `Result`s so a malformed row can be
/// reported and skipped without aborting the stream.
pub struct LessonReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> LessonReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn lessons(self) -> impl Iterator<Item = Result<CompletedLesson, LedgerError>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lesson::{LessonId, StudentId};
    use crate::domain::teacher::TeacherId;

    #[test]
    fn test_reader_valid_stream() {
        let data = "lesson_id, teacher_id, student_id, duration_minutes, scheduled_time\n\
                    1, 10, 100, 60, 2026-01-05T10:00:00Z\n\
                    2, 10, 101, 30, 2026-01-06T09:00:00Z";
        let reader = LessonReader::new(data.as_bytes());
        let results: Vec<Result<CompletedLesson, LedgerError>> = reader.lessons().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.lesson_id, LessonId(1));
        assert_eq!(first.teacher_id, TeacherId(10));
        assert_eq!(first.student_id, StudentId(100));
        let second = results[1].as_ref().unwrap();
        assert_eq!(second.duration_minutes, 30);
    }

    #[test]
    fn test_reader_malformed_row() {
        let data = "lesson_id, teacher_id, student_id, duration_minutes, scheduled_time\n\
                    1, 10, 100, not_a_number, 2026-01-05T10:00:00Z";
        let reader = LessonReader::new(data.as_bytes());
        let results: Vec<Result<CompletedLesson, LedgerError>> = reader.lessons().collect();

        assert!(results[0].is_err());
    }
}
