use super::tiers::TierEngine;
use crate::domain::application::{
    ApplicationEvidence, ApplicationId, ApplicationStatus, ReviewDecision, TierApplication,
};
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::ports::{ApplicationStoreRef, NotificationOutboxRef, TeacherStoreRef};
use crate::domain::teacher::TeacherId;
use crate::domain::tier::{TierLevel, TierRegistry};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Manual-review path for top-tier promotion requests.
///
/// Submission pre-screens the basic thresholds and parks unmet requests in
/// `Pending` with a readable reason. Approval always runs through the tier
/// engine's manual assignment; the workflow itself never changes a tier.
pub struct ApplicationWorkflow {
    teachers: TeacherStoreRef,
    applications: ApplicationStoreRef,
    registry: Arc<TierRegistry>,
    outbox: NotificationOutboxRef,
    tiers: Arc<TierEngine>,
}

impl ApplicationWorkflow {
    pub fn new(
        teachers: TeacherStoreRef,
        applications: ApplicationStoreRef,
        registry: Arc<TierRegistry>,
        outbox: NotificationOutboxRef,
        tiers: Arc<TierEngine>,
    ) -> Self {
        Self {
            teachers,
            applications,
            registry,
            outbox,
            tiers,
        }
    }

    pub async fn submit(
        &self,
        teacher_id: TeacherId,
        requested_tier: TierLevel,
        evidence: ApplicationEvidence,
        now: DateTime<Utc>,
    ) -> Result<TierApplication> {
        let profile = self
            .teachers
            .get(teacher_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("teacher {teacher_id}")))?;
        let definition = self.registry.get(requested_tier)?;

        if requested_tier <= profile.current_tier {
            return Err(LedgerError::Validation(format!(
                "requested tier {requested_tier} is not above current tier {}",
                profile.current_tier
            )));
        }
        if definition.auto_promotable {
            return Err(LedgerError::Validation(format!(
                "tier {requested_tier} is granted automatically, no application needed"
            )));
        }

        let mut unmet = Vec::new();
        if profile.hours_taught < definition.min_hours_taught {
            unmet.push(format!(
                "hours taught {} below required {}",
                profile.hours_taught, definition.min_hours_taught
            ));
        }
        if profile.average_rating < definition.min_rating {
            unmet.push(format!(
                "rating {:.1} below required {:.1}",
                profile.average_rating, definition.min_rating
            ));
        }
        if !evidence.declares_language_proficiency {
            unmet.push("language proficiency not declared".to_string());
        }

        let (status, review_notes) = if unmet.is_empty() {
            (ApplicationStatus::UnderReview, None)
        } else {
            (ApplicationStatus::Pending, Some(unmet.join("; ")))
        };

        // The store assigns the real id and rejects a second open
        // application for the same teacher.
        let application = self
            .applications
            .create(TierApplication {
                id: ApplicationId(0),
                teacher_id,
                requested_tier,
                evidence,
                status,
                review_notes,
                granted_rate: None,
                submitted_at: now,
                decided_at: None,
            })
            .await?;

        let notification = Notification::new(
            NotificationKind::ApplicationReceived,
            teacher_id,
            json!({
                "application_id": application.id.0,
                "requested_tier": requested_tier.name(),
                "status": application.status,
            }),
            now,
        );
        if let Err(err) = self.outbox.enqueue(notification).await {
            warn!(teacher = %teacher_id, %err, "failed to notify reviewers");
        }

        Ok(application)
    }

    /// Decides a non-terminal application. Approval delegates to the tier
    /// engine so the profile update, history entry, and application
    /// approval land together.
    pub async fn review(
        &self,
        application_id: ApplicationId,
        decision: ReviewDecision,
        notes: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<TierApplication> {
        let mut application = self
            .applications
            .get(application_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("application {application_id}")))?;
        if application.status.is_terminal() {
            return Err(LedgerError::Validation(format!(
                "application {application_id} is already decided"
            )));
        }

        match decision {
            ReviewDecision::Reject => {
                application.status = ApplicationStatus::Rejected;
                application.review_notes = Some(notes.to_string());
                application.decided_at = Some(now);
                self.applications.update(application.clone()).await?;
                Ok(application)
            }
            ReviewDecision::Approve => {
                self.tiers
                    .assign_tier(
                        application.teacher_id,
                        application.requested_tier,
                        notes,
                        actor,
                        false,
                        Some(application_id),
                        now,
                    )
                    .await?;
                self.applications
                    .get(application_id)
                    .await?
                    .ok_or_else(|| LedgerError::NotFound(format!("application {application_id}")))
            }
        }
    }
}
