use crate::domain::earning::{EarningStatus, TeacherEarning};
use crate::domain::money::Money;
use crate::domain::payout::PayoutBatch;
use crate::domain::teacher::TeacherProfile;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One line of the per-teacher settlement report.
#[derive(Debug, Serialize, PartialEq)]
pub struct ReportRow {
    pub teacher_id: u32,
    pub tier: &'static str,
    pub held: Money,
    pub cleared: Money,
    pub paid: Money,
    pub last_batch: String,
}

impl ReportRow {
    pub fn build(
        profile: &TeacherProfile,
        earnings: &[TeacherEarning],
        batches: &[PayoutBatch],
    ) -> Self {
        let sum = |status: EarningStatus| {
            earnings
                .iter()
                .filter(|e| e.status == status)
                .fold(Money::ZERO, |acc, e| acc + e.amount_earned)
        };
        Self {
            teacher_id: profile.id.0,
            tier: profile.current_tier.name(),
            held: sum(EarningStatus::Held),
            cleared: sum(EarningStatus::Cleared),
            paid: sum(EarningStatus::Paid),
            last_batch: batches
                .last()
                .map(|b| b.status.label().to_string())
                .unwrap_or_else(|| "none".to_string()),
        }
    }
}

/// Writes the settlement report as CSV to any sink.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_rows(&mut self, rows: Vec<ReportRow>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
