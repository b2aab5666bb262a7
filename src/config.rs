use std::time::Duration;

/// Explicit configuration for the ledger and settlement engines.
///
/// Passed into each component at construction so tests can vary thresholds
/// deterministically instead of relying on ambient constants.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Dispute/chargeback window applied to every new earning.
    pub hold_period_days: i64,
    /// Below this many distinct students, retention is an insufficient
    /// sample and never gates tier eligibility.
    pub min_students_for_retention: u32,
    /// Upper bound on a single payment-rail transfer call.
    pub rail_timeout: Duration,
    /// Currency code stamped on earnings and batches.
    pub currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            hold_period_days: 7,
            min_students_for_retention: 5,
            rail_timeout: Duration::from_secs(10),
            currency: "GBP".to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn with_hold_period_days(mut self, days: i64) -> Self {
        self.hold_period_days = days;
        self
    }

    pub fn with_min_students_for_retention(mut self, min: u32) -> Self {
        self.min_students_for_retention = min;
        self
    }

    pub fn with_rail_timeout(mut self, timeout: Duration) -> Self {
        self.rail_timeout = timeout;
        self
    }
}
