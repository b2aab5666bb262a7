use super::money::Rate;
use super::teacher::{RetentionSample, TeacherId, TeacherProfile};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered rate tiers. A higher level never pays a lower hourly rate; the
/// registry rejects tables that violate this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TierLevel {
    Newcomer,
    Apprentice,
    Skilled,
    Expert,
    Master,
}

impl TierLevel {
    pub const ALL: [TierLevel; 5] = [
        TierLevel::Newcomer,
        TierLevel::Apprentice,
        TierLevel::Skilled,
        TierLevel::Expert,
        TierLevel::Master,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TierLevel::Newcomer => "newcomer",
            TierLevel::Apprentice => "apprentice",
            TierLevel::Skilled => "skilled",
            TierLevel::Expert => "expert",
            TierLevel::Master => "master",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "newcomer" => Ok(TierLevel::Newcomer),
            "apprentice" => Ok(TierLevel::Apprentice),
            "skilled" => Ok(TierLevel::Skilled),
            "expert" => Ok(TierLevel::Expert),
            "master" => Ok(TierLevel::Master),
            other => Err(LedgerError::Validation(format!("unknown tier: {other}"))),
        }
    }
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the tier table: promotion thresholds and the rate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub level: TierLevel,
    pub display_name: String,
    pub min_hours_taught: Decimal,
    pub min_rating: f64,
    /// None for tiers that never gate on retention.
    pub min_retention_rate: Option<f64>,
    pub min_students_for_retention: u32,
    pub teacher_hourly_rate: Rate,
    pub student_hourly_price: Rate,
    /// Lower/mid tiers promote automatically; top tiers require an
    /// application plus manual review.
    pub auto_promotable: bool,
}

/// Validated, ordered tier table. Read-only to every engine.
#[derive(Debug, Clone)]
pub struct TierRegistry {
    tiers: Vec<TierDefinition>,
}

impl TierRegistry {
    /// Builds a registry, rejecting duplicate levels, rate inversions
    /// (a higher level with a lower teacher rate), and tiers priced below
    /// what the teacher is paid.
    pub fn new(mut tiers: Vec<TierDefinition>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(LedgerError::Validation(
                "tier registry must not be empty".to_string(),
            ));
        }
        tiers.sort_by_key(|t| t.level);
        for pair in tiers.windows(2) {
            if pair[0].level == pair[1].level {
                return Err(LedgerError::Validation(format!(
                    "duplicate tier level: {}",
                    pair[0].level
                )));
            }
            if pair[1].teacher_hourly_rate < pair[0].teacher_hourly_rate {
                return Err(LedgerError::Validation(format!(
                    "tier {} pays less than tier {}",
                    pair[1].level, pair[0].level
                )));
            }
        }
        for tier in &tiers {
            if tier.student_hourly_price < tier.teacher_hourly_rate {
                return Err(LedgerError::Validation(format!(
                    "tier {} is priced below the teacher rate",
                    tier.level
                )));
            }
        }
        Ok(Self { tiers })
    }

    pub fn get(&self, level: TierLevel) -> Result<&TierDefinition> {
        self.tiers
            .iter()
            .find(|t| t.level == level)
            .ok_or_else(|| LedgerError::Validation(format!("unknown tier: {level}")))
    }

    /// Tiers from highest to lowest level, the order tier evaluation walks.
    pub fn descending(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.iter().rev()
    }

    pub fn lowest(&self) -> &TierDefinition {
        &self.tiers[0]
    }

    /// The production tier table.
    pub fn standard() -> Self {
        let tier = |level,
                    name: &str,
                    hours,
                    rating,
                    retention,
                    rate,
                    price,
                    auto| TierDefinition {
            level,
            display_name: name.to_string(),
            min_hours_taught: hours,
            min_rating: rating,
            min_retention_rate: retention,
            min_students_for_retention: 5,
            teacher_hourly_rate: Rate::new(rate).expect("standard rate"),
            student_hourly_price: Rate::new(price).expect("standard price"),
            auto_promotable: auto,
        };
        Self::new(vec![
            tier(
                TierLevel::Newcomer,
                "Newcomer",
                dec!(0),
                0.0,
                None,
                dec!(5.00),
                dec!(8.00),
                true,
            ),
            tier(
                TierLevel::Apprentice,
                "Apprentice",
                dec!(25),
                4.0,
                None,
                dec!(6.50),
                dec!(10.00),
                true,
            ),
            tier(
                TierLevel::Skilled,
                "Skilled",
                dec!(100),
                4.3,
                Some(0.40),
                dec!(8.00),
                dec!(12.50),
                true,
            ),
            tier(
                TierLevel::Expert,
                "Expert",
                dec!(250),
                4.5,
                Some(0.55),
                dec!(11.00),
                dec!(17.00),
                false,
            ),
            tier(
                TierLevel::Master,
                "Master",
                dec!(600),
                4.7,
                Some(0.65),
                dec!(15.00),
                dec!(23.00),
                false,
            ),
        ])
        .expect("standard tier table is valid")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionKind {
    Auto,
    Manual,
}

/// Teacher metrics captured at the moment of a tier change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hours_taught: Decimal,
    pub completed_lessons: u32,
    pub average_rating: f64,
    pub retention: RetentionSample,
}

impl MetricsSnapshot {
    pub fn of(profile: &TeacherProfile) -> Self {
        Self {
            hours_taught: profile.hours_taught,
            completed_lessons: profile.completed_lessons,
            average_rating: profile.average_rating,
            retention: profile.retention,
        }
    }
}

/// Immutable record of one tier change. The profile's current tier must
/// always equal the `to_tier` of the teacher's latest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierHistoryEntry {
    pub teacher_id: TeacherId,
    pub from_tier: TierLevel,
    pub to_tier: TierLevel,
    pub kind: PromotionKind,
    pub reason: String,
    pub metrics: MetricsSnapshot,
    pub actor: String,
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_level_ordering() {
        assert!(TierLevel::Newcomer < TierLevel::Apprentice);
        assert!(TierLevel::Expert < TierLevel::Master);
    }

    #[test]
    fn test_parse_tier_names() {
        assert_eq!(TierLevel::parse("Skilled").unwrap(), TierLevel::Skilled);
        assert_eq!(TierLevel::parse(" master ").unwrap(), TierLevel::Master);
        assert!(matches!(
            TierLevel::parse("grandmaster"),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_standard_registry_is_ordered() {
        let registry = TierRegistry::standard();
        let levels: Vec<TierLevel> = registry.descending().map(|t| t.level).collect();
        assert_eq!(levels[0], TierLevel::Master);
        assert_eq!(levels[4], TierLevel::Newcomer);
        assert_eq!(registry.lowest().level, TierLevel::Newcomer);
    }

    #[test]
    fn test_registry_rejects_rate_inversion() {
        let mut tiers: Vec<TierDefinition> =
            TierRegistry::standard().descending().cloned().collect();
        // Pay masters less than newcomers.
        tiers[0].teacher_hourly_rate = Rate::new(dec!(1.00)).unwrap();
        assert!(matches!(
            TierRegistry::new(tiers),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_registry_rejects_price_below_rate() {
        let mut tiers: Vec<TierDefinition> =
            TierRegistry::standard().descending().cloned().collect();
        tiers[0].student_hourly_price = Rate::new(dec!(0.50)).unwrap();
        assert!(matches!(
            TierRegistry::new(tiers),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_top_tiers_are_not_auto_promotable() {
        let registry = TierRegistry::standard();
        assert!(registry.get(TierLevel::Skilled).unwrap().auto_promotable);
        assert!(!registry.get(TierLevel::Expert).unwrap().auto_promotable);
        assert!(!registry.get(TierLevel::Master).unwrap().auto_promotable);
    }
}
