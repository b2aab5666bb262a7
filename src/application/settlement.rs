use crate::config::LedgerConfig;
use crate::domain::earning::TeacherEarning;
use crate::domain::lesson::LessonId;
use crate::domain::money::Money;
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::payout::{BatchStatus, CycleSummary, PayoutBatch, TransferRequest};
use crate::domain::ports::{
    BatchStoreRef, EarningStoreRef, NotificationOutboxRef, PaymentRailRef, TeacherStoreRef,
};
use crate::domain::teacher::TeacherId;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Periodic settlement job: groups cleared earnings per teacher, creates a
/// payout batch, calls the payment rail, and reconciles the outcome.
///
/// Stateless between invocations. Teachers are settled one at a time so a
/// single transfer failure stays inside that teacher's batch; a failed batch
/// leaves its earnings cleared and the next cycle retries them naturally.
pub struct SettlementProcessor {
    teachers: TeacherStoreRef,
    earnings: EarningStoreRef,
    batches: BatchStoreRef,
    rail: PaymentRailRef,
    outbox: NotificationOutboxRef,
    config: LedgerConfig,
}

impl SettlementProcessor {
    pub fn new(
        teachers: TeacherStoreRef,
        earnings: EarningStoreRef,
        batches: BatchStoreRef,
        rail: PaymentRailRef,
        outbox: NotificationOutboxRef,
        config: LedgerConfig,
    ) -> Self {
        Self {
            teachers,
            earnings,
            batches,
            rail,
            outbox,
            config,
        }
    }

    pub async fn run_settlement_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        let mut per_teacher: BTreeMap<TeacherId, Vec<TeacherEarning>> = BTreeMap::new();
        for earning in self.earnings.cleared().await? {
            per_teacher.entry(earning.teacher_id).or_default().push(earning);
        }

        let mut summary = CycleSummary::default();
        for (teacher_id, group) in per_teacher {
            match self.settle_teacher(teacher_id, group, now).await? {
                TeacherOutcome::Skipped => {}
                TeacherOutcome::Paid(amount) => {
                    summary.processed += 1;
                    summary.succeeded += 1;
                    summary.total_transferred += amount;
                }
                TeacherOutcome::Failed => {
                    summary.processed += 1;
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            total = %summary.total_transferred,
            "settlement cycle finished"
        );
        Ok(summary)
    }

    /// Settles one teacher's cleared earnings. Rail failures are contained
    /// here; only datastore errors propagate and abort the cycle.
    async fn settle_teacher(
        &self,
        teacher_id: TeacherId,
        group: Vec<TeacherEarning>,
        now: DateTime<Utc>,
    ) -> Result<TeacherOutcome> {
        let Some(profile) = self.teachers.get(teacher_id).await? else {
            warn!(teacher = %teacher_id, "cleared earnings for unknown teacher, skipping");
            return Ok(TeacherOutcome::Skipped);
        };
        let Some(destination) = profile.payout_account else {
            debug!(teacher = %teacher_id, "no verified payout account, skipping");
            return Ok(TeacherOutcome::Skipped);
        };

        let total = group
            .iter()
            .fold(Money::ZERO, |acc, e| acc + e.amount_earned);
        let lesson_ids: Vec<LessonId> = group.iter().map(|e| e.lesson_id).collect();

        // Conditional insert is the double-payout guard: while a batch for
        // this teacher is still processing, the store rejects a second one.
        let batch = match self
            .batches
            .create_processing(
                teacher_id,
                total,
                self.config.currency.clone(),
                lesson_ids.len() as u32,
                now,
            )
            .await
        {
            Ok(batch) => batch,
            Err(err) if err.is_conflict() => {
                warn!(teacher = %teacher_id, "payout batch already in flight, skipping");
                return Ok(TeacherOutcome::Skipped);
            }
            Err(err) => return Err(err),
        };

        let request = TransferRequest {
            amount: total,
            currency: batch.currency.clone(),
            destination_account: destination,
            idempotency_key: batch.idempotency_key(),
        };
        let transfer = match tokio::time::timeout(
            self.config.rail_timeout,
            self.rail.create_transfer(request),
        )
        .await
        {
            Ok(Ok(transfer_id)) => Ok(transfer_id),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err("transfer timed out".to_string()),
        };

        match transfer {
            Ok(transfer_id) => {
                self.earnings.mark_paid(&lesson_ids, batch.id, now).await?;
                self.batches
                    .finish(
                        batch.id,
                        BatchStatus::Completed,
                        Some(transfer_id.0.clone()),
                        now,
                    )
                    .await?;
                self.notify_teacher(&batch, NotificationKind::PayoutCompleted, None, now)
                    .await;
                info!(teacher = %teacher_id, batch = %batch.id, amount = %total, "payout completed");
                Ok(TeacherOutcome::Paid(total))
            }
            Err(reason) => {
                // Earnings stay cleared; the next cycle picks them up again.
                self.batches
                    .finish(
                        batch.id,
                        BatchStatus::Failed {
                            reason: reason.clone(),
                        },
                        None,
                        now,
                    )
                    .await?;
                self.notify_teacher(&batch, NotificationKind::PayoutFailed, Some(&reason), now)
                    .await;
                warn!(teacher = %teacher_id, batch = %batch.id, %reason, "payout failed");
                Ok(TeacherOutcome::Failed)
            }
        }
    }

    async fn notify_teacher(
        &self,
        batch: &PayoutBatch,
        kind: NotificationKind,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let notification = Notification::new(
            kind,
            batch.teacher_id,
            json!({
                "batch_id": batch.id.0,
                "amount": batch.total_amount,
                "currency": batch.currency,
                "reason": reason,
            }),
            now,
        );
        if let Err(err) = self.outbox.enqueue(notification).await {
            warn!(teacher = %batch.teacher_id, %err, "failed to enqueue payout notification");
        }
    }
}

enum TeacherOutcome {
    Skipped,
    Paid(Money),
    Failed,
}
