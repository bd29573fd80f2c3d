//! Filter argument parsing for read queries
//!
//! `filtro_tx` accepts its arguments in any order. Tokens are claimed by the
//! first slot they fit, in priority order: type, month, year, category.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::error::LedgerError;
use crate::models::period::month_from_name;
use crate::models::{MonthPeriod, TransactionType};

const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2100;

/// Filter validation failures, each carrying the reply shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Mes inválido. Usá nombre (mayo) o número (5).")]
    InvalidMonth,
    #[error("Año inválido. Usá un año con 4 dígitos (ej: 2024).")]
    InvalidYear,
}

impl From<FilterError> for LedgerError {
    fn from(err: FilterError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Parsed and validated filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub month: u32,
    pub year: i32,
    /// The month came from the arguments rather than today's date
    pub month_provided: bool,
    /// The year came from the arguments rather than today's date
    pub year_provided: bool,
}

impl FilterCriteria {
    /// Month period selected by the filter
    pub fn period(&self) -> Result<MonthPeriod, LedgerError> {
        MonthPeriod::new(self.year, self.month)
            .map_err(|_| LedgerError::from(FilterError::InvalidMonth))
    }

    /// Whether a transaction passes the type and category narrowing
    pub fn matches(&self, kind: TransactionType, category: &str) -> bool {
        let kind_ok = self.kind.map_or(true, |k| k == kind);
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| c.to_lowercase() == category.to_lowercase());
        kind_ok && category_ok
    }
}

enum MonthToken {
    Named(u32),
    Numeric(Option<u32>),
}

fn classify_month(token: &str) -> Option<MonthToken> {
    if let Some(month) = month_from_name(token) {
        return Some(MonthToken::Named(month));
    }
    if is_digits(token) && token.len() != 4 {
        return Some(MonthToken::Numeric(token.parse().ok()));
    }
    None
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Parser for `filtro_tx` arguments
pub struct FilterValidator;

impl FilterValidator {
    /// Parse against the local date
    pub fn parse(args: &str) -> Result<FilterCriteria, FilterError> {
        Self::parse_at(args, chrono::Local::now().date_naive())
    }

    /// Parse, defaulting month and year from `today`
    pub fn parse_at(args: &str, today: NaiveDate) -> Result<FilterCriteria, FilterError> {
        let mut kind = None;
        let mut category = None;
        let mut month: Option<Option<u32>> = None;
        let mut year: Option<Option<i32>> = None;

        for token in args.split_whitespace() {
            let normalized = token.to_lowercase();

            if kind.is_none() {
                if let Some(parsed) = TransactionType::from_token(&normalized) {
                    kind = Some(parsed);
                    continue;
                }
            }

            if month.is_none() {
                if let Some(parsed) = classify_month(&normalized) {
                    month = Some(match parsed {
                        MonthToken::Named(m) => Some(m),
                        MonthToken::Numeric(m) => m,
                    });
                    continue;
                }
            }

            if year.is_none() && normalized.len() == 4 && is_digits(&normalized) {
                year = Some(normalized.parse().ok());
                continue;
            }

            if category.is_none() {
                category = Some(token.to_string());
            }
        }

        let month_provided = month.is_some();
        let year_provided = year.is_some();

        let month = match month {
            Some(Some(m)) if (1..=12).contains(&m) => m,
            Some(_) => return Err(FilterError::InvalidMonth),
            None => today.month(),
        };
        let year = match year {
            Some(Some(y)) if (MIN_YEAR..=MAX_YEAR).contains(&y) => y,
            Some(_) => return Err(FilterError::InvalidYear),
            None => today.year(),
        };

        Ok(FilterCriteria {
            kind,
            category,
            month,
            year,
            month_provided,
            year_provided,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn test_empty_args_default_to_today() {
        let criteria = FilterValidator::parse_at("", today()).unwrap();
        assert_eq!(criteria.kind, None);
        assert_eq!(criteria.category, None);
        assert_eq!((criteria.month, criteria.year), (5, 2025));
        assert!(!criteria.month_provided);
        assert!(!criteria.year_provided);
    }

    #[test]
    fn test_bare_category() {
        let criteria = FilterValidator::parse_at("comida", today()).unwrap();
        assert_eq!(criteria.category.as_deref(), Some("comida"));
        assert_eq!(criteria.kind, None);
        assert!(!criteria.month_provided);
    }

    #[test]
    fn test_all_tokens_in_any_order() {
        let criteria = FilterValidator::parse_at("2024 comida marzo gasto", today()).unwrap();
        assert_eq!(criteria.kind, Some(TransactionType::Outgo));
        assert_eq!(criteria.category.as_deref(), Some("comida"));
        assert_eq!(criteria.month, 3);
        assert_eq!(criteria.year, 2024);
        assert!(criteria.month_provided);
        assert!(criteria.year_provided);
    }

    #[test]
    fn test_stored_type_names_and_numeric_month() {
        let criteria = FilterValidator::parse_at("INCOME 5", today()).unwrap();
        assert_eq!(criteria.kind, Some(TransactionType::Income));
        assert_eq!(criteria.month, 5);
        assert!(criteria.month_provided);
    }

    #[test]
    fn test_rejects_month_13() {
        let err = FilterValidator::parse_at("gasto 13", today()).unwrap_err();
        assert_eq!(err, FilterError::InvalidMonth);
        assert_eq!(
            err.to_string(),
            "Mes inválido. Usá nombre (mayo) o número (5)."
        );

        assert_eq!(
            FilterValidator::parse_at("0", today()).unwrap_err(),
            FilterError::InvalidMonth
        );
    }

    #[test]
    fn test_rejects_years_out_of_range() {
        for args in ["1999", "2101", "mayo 0999"] {
            let err = FilterValidator::parse_at(args, today()).unwrap_err();
            assert_eq!(err, FilterError::InvalidYear, "args: {}", args);
        }
        assert!(FilterValidator::parse_at("2000", today()).is_ok());
        assert!(FilterValidator::parse_at("2100", today()).is_ok());
    }

    #[test]
    fn test_first_token_wins_each_slot() {
        let criteria = FilterValidator::parse_at("ingreso gasto comida sueldo", today()).unwrap();
        assert_eq!(criteria.kind, Some(TransactionType::Income));
        // a second type word falls through to category
        assert_eq!(criteria.category.as_deref(), Some("gasto"));
    }

    #[test]
    fn test_error_converts_to_validation() {
        let err: LedgerError = FilterError::InvalidYear.into();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(err.to_string(), "Año inválido. Usá un año con 4 dígitos (ej: 2024).");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let criteria = FilterValidator::parse_at("gasto Comida", today()).unwrap();
        assert!(criteria.matches(TransactionType::Outgo, "comida"));
        assert!(!criteria.matches(TransactionType::Income, "comida"));
        assert!(!criteria.matches(TransactionType::Outgo, "ropa"));
    }
}
