//! Monthly closure model
//!
//! An immutable income/outgo/balance snapshot for one calendar month. At most
//! one closure exists per `(month, year)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ClosureId;
use super::money::Money;
use super::period::MonthPeriod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyClosure {
    pub id: ClosureId,
    pub month: u32,
    pub year: i32,
    /// Sum of income in the period (never negative)
    pub income: Money,
    /// Magnitude of outgo in the period (never negative)
    pub outgo: Money,
    /// `income - outgo`
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl MonthlyClosure {
    /// Build a closure from the period's income sum and signed outgo sum
    pub fn from_totals(period: MonthPeriod, income: Money, signed_outgo: Money) -> Self {
        Self {
            id: ClosureId::new(),
            month: period.month(),
            year: period.year(),
            income,
            outgo: signed_outgo.abs(),
            balance: income + signed_outgo,
            created_at: Utc::now(),
        }
    }

    /// The unique key of this closure
    pub fn key(&self) -> (u32, i32) {
        (self.month, self.year)
    }

    pub fn matches(&self, month: u32, year: i32) -> bool {
        self.month == month && self.year == year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_totals() {
        let period = MonthPeriod::new(2025, 5).unwrap();
        let closure =
            MonthlyClosure::from_totals(period, Money::from_units(1000), Money::from_units(-1300));

        assert_eq!(closure.key(), (5, 2025));
        assert_eq!(closure.income, Money::from_units(1000));
        assert_eq!(closure.outgo, Money::from_units(1300));
        assert_eq!(closure.balance, Money::from_units(-300));
        assert!(closure.matches(5, 2025));
        assert!(!closure.matches(6, 2025));
    }
}
