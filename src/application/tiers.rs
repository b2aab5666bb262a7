use crate::domain::application::{ApplicationId, ApplicationStatus};
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::ports::{
    ApplicationStoreRef, NotificationOutboxRef, TeacherStoreRef, TierHistoryStoreRef,
};
use crate::domain::teacher::{RetentionSample, TeacherId, TeacherProfile};
use crate::domain::tier::{
    MetricsSnapshot, PromotionKind, TierDefinition, TierHistoryEntry, TierLevel, TierRegistry,
};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of an automatic tier evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierEvaluation {
    Unchanged(TierLevel),
    Promoted { from: TierLevel, to: TierLevel },
    /// The teacher qualifies for a higher tier that cannot be applied
    /// automatically (top tier, or auto-progression disabled).
    NotApplied {
        current: TierLevel,
        eligible: TierLevel,
        reason: String,
    },
}

/// Compares teacher metrics against the tier table and applies promotions.
///
/// Auto-promotion covers the auto-promotable tiers only; top tiers are
/// granted exclusively through [`TierEngine::assign_tier`], usually closing
/// a reviewed application.
pub struct TierEngine {
    teachers: TeacherStoreRef,
    history: TierHistoryStoreRef,
    applications: ApplicationStoreRef,
    registry: Arc<TierRegistry>,
    outbox: NotificationOutboxRef,
}

impl TierEngine {
    pub fn new(
        teachers: TeacherStoreRef,
        history: TierHistoryStoreRef,
        applications: ApplicationStoreRef,
        registry: Arc<TierRegistry>,
        outbox: NotificationOutboxRef,
    ) -> Self {
        Self {
            teachers,
            history,
            applications,
            registry,
            outbox,
        }
    }

    fn qualifies(profile: &TeacherProfile, tier: &TierDefinition) -> bool {
        if profile.hours_taught < tier.min_hours_taught {
            return false;
        }
        if profile.average_rating < tier.min_rating {
            return false;
        }
        if let Some(min_retention) = tier.min_retention_rate {
            // Retention only gates once the sample is large enough.
            if let RetentionSample::Measured { rate, students } = profile.retention
                && students >= tier.min_students_for_retention
                && rate < min_retention
            {
                return false;
            }
        }
        true
    }

    /// Highest tier whose thresholds the profile meets. Falls back to the
    /// lowest tier, whose thresholds are zero.
    fn eligible_tier(&self, profile: &TeacherProfile) -> TierLevel {
        self.registry
            .descending()
            .find(|tier| Self::qualifies(profile, tier))
            .map(|tier| tier.level)
            .unwrap_or(self.registry.lowest().level)
    }

    /// Re-evaluates one teacher and auto-promotes when allowed. Evaluation
    /// never demotes; a lower eligible tier is reported as unchanged.
    pub async fn evaluate(&self, teacher_id: TeacherId, now: DateTime<Utc>) -> Result<TierEvaluation> {
        let profile = self
            .teachers
            .get(teacher_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("teacher {teacher_id}")))?;

        let eligible = self.eligible_tier(&profile);
        if eligible <= profile.current_tier {
            return Ok(TierEvaluation::Unchanged(profile.current_tier));
        }
        if profile.manual_override {
            return Ok(TierEvaluation::NotApplied {
                current: profile.current_tier,
                eligible,
                reason: "auto progression disabled by manual override".to_string(),
            });
        }
        if !self.registry.get(eligible)?.auto_promotable {
            return Ok(TierEvaluation::NotApplied {
                current: profile.current_tier,
                eligible,
                reason: format!("tier {eligible} requires an application"),
            });
        }

        let from = profile.current_tier;
        self.apply_change(
            profile,
            eligible,
            PromotionKind::Auto,
            "thresholds met on periodic evaluation",
            "tier-engine",
            now,
        )
        .await?;
        info!(teacher = %teacher_id, %from, to = %eligible, "auto tier promotion");
        Ok(TierEvaluation::Promoted { from, to: eligible })
    }

    /// Manual tier assignment by an authorized actor.
    ///
    /// When `from_application` is set the referenced application must be a
    /// non-terminal request for the same teacher and tier; it is approved
    /// and stamped with the granted rate in the same step. All validation
    /// happens before any write, so a failure leaves nothing partially
    /// applied.
    pub async fn assign_tier(
        &self,
        teacher_id: TeacherId,
        new_tier: TierLevel,
        reason: &str,
        actor: &str,
        disable_auto_progression: bool,
        from_application: Option<ApplicationId>,
        now: DateTime<Utc>,
    ) -> Result<TierHistoryEntry> {
        let mut profile = self
            .teachers
            .get(teacher_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("teacher {teacher_id}")))?;
        let definition = self.registry.get(new_tier)?;

        let application = match from_application {
            None => None,
            Some(id) => {
                let application = self
                    .applications
                    .get(id)
                    .await?
                    .ok_or_else(|| LedgerError::NotFound(format!("application {id}")))?;
                if application.teacher_id != teacher_id {
                    return Err(LedgerError::Validation(format!(
                        "application {id} does not belong to teacher {teacher_id}"
                    )));
                }
                if application.status.is_terminal() {
                    return Err(LedgerError::Validation(format!(
                        "application {id} is already decided"
                    )));
                }
                if application.requested_tier != new_tier {
                    return Err(LedgerError::Validation(format!(
                        "application {id} requested tier {}, not {new_tier}",
                        application.requested_tier
                    )));
                }
                Some(application)
            }
        };

        if disable_auto_progression {
            profile.manual_override = true;
        }
        let entry = self
            .apply_change(profile, new_tier, PromotionKind::Manual, reason, actor, now)
            .await?;

        if let Some(mut application) = application {
            application.status = ApplicationStatus::Approved;
            application.review_notes = Some(reason.to_string());
            application.granted_rate = Some(definition.teacher_hourly_rate);
            application.decided_at = Some(now);
            self.applications.update(application).await?;
        }

        Ok(entry)
    }

    /// Writes the history entry and the profile update together, then
    /// enqueues the tier-change notification (best effort).
    async fn apply_change(
        &self,
        mut profile: TeacherProfile,
        to_tier: TierLevel,
        kind: PromotionKind,
        reason: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<TierHistoryEntry> {
        let entry = TierHistoryEntry {
            teacher_id: profile.id,
            from_tier: profile.current_tier,
            to_tier,
            kind,
            reason: reason.to_string(),
            metrics: MetricsSnapshot::of(&profile),
            actor: actor.to_string(),
            changed_at: now,
        };
        self.history.append(entry.clone()).await?;
        profile.current_tier = to_tier;
        self.teachers.upsert(profile).await?;

        let notification = Notification::new(
            NotificationKind::TierChanged,
            entry.teacher_id,
            json!({
                "from_tier": entry.from_tier.name(),
                "to_tier": entry.to_tier.name(),
                "reason": entry.reason,
            }),
            now,
        );
        if let Err(err) = self.outbox.enqueue(notification).await {
            warn!(teacher = %entry.teacher_id, %err, "failed to enqueue tier notification");
        }
        Ok(entry)
    }
}
