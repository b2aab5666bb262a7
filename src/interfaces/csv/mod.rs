pub mod lesson_reader;
pub mod report_writer;
