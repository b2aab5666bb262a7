use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// A monetary value rounded to 2 decimal places.
///
/// Wrapper around `rust_decimal::Decimal` so amounts entering the ledger are
/// always rounded the same way and serialized with a fixed 2-digit scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp(2))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&format_args!("{:.2}", self.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// A positive hourly rate.
///
/// Tier rates and the per-earning rate snapshot use this type so a zero or
/// negative rate can never be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(
                "hourly rate must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Amount owed for a lesson of the given length at this rate.
    pub fn for_minutes(&self, minutes: u32) -> Money {
        Money::new(self.0 * Decimal::from(minutes) / Decimal::from(60))
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounding_and_display() {
        let m = Money::new(dec!(8.005));
        assert_eq!(m.value(), dec!(8.00));
        assert_eq!(m.to_string(), "8.00");
        assert_eq!(Money::new(dec!(5)).to_string(), "5.00");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(10.0));
        let b = Money::new(dec!(2.5));
        assert_eq!(a + b, Money::new(dec!(12.5)));
        assert_eq!(a - b, Money::new(dec!(7.5)));
    }

    #[test]
    fn test_rate_validation() {
        assert!(Rate::new(dec!(8.0)).is_ok());
        assert!(matches!(
            Rate::new(dec!(0.0)),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            Rate::new(dec!(-1.0)),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_rate_for_minutes() {
        let rate = Rate::new(dec!(8.0)).unwrap();
        assert_eq!(rate.for_minutes(60), Money::new(dec!(8.00)));
        assert_eq!(rate.for_minutes(90), Money::new(dec!(12.00)));
        assert_eq!(rate.for_minutes(25), Money::new(dec!(3.33)));
    }
}
