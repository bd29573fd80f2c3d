//! Transaction model
//!
//! Represents a single income or outgo entry. Amounts are stored signed:
//! positive for income, negative for outgo, so period totals are plain sums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::TransactionId;
use super::money::Money;

/// Kind of transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Outgo,
}

/// Command words mapped to transaction types
const TYPE_TABLE: [(&str, TransactionType); 2] = [
    ("ingreso", TransactionType::Income),
    ("gasto", TransactionType::Outgo),
];

impl TransactionType {
    /// Map a command word (`ingreso`/`gasto`) to a type
    pub fn from_command(word: &str) -> Option<Self> {
        let word = word.trim().to_lowercase();
        TYPE_TABLE
            .iter()
            .find(|(command, _)| *command == word)
            .map(|(_, kind)| *kind)
    }

    /// Map either a command word or a stored type name to a type
    pub fn from_token(token: &str) -> Option<Self> {
        Self::from_command(token).or_else(|| match token.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "outgo" => Some(Self::Outgo),
            _ => None,
        })
    }

    /// The stored name (`income`/`outgo`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Outgo => "outgo",
        }
    }

    /// The command word users type for this type
    pub fn command_word(&self) -> &'static str {
        match self {
            Self::Income => "ingreso",
            Self::Outgo => "gasto",
        }
    }

    /// Apply the sign convention to a non-negative magnitude
    pub fn signed(&self, magnitude: Money) -> Money {
        match self {
            Self::Income => magnitude.abs(),
            Self::Outgo => -magnitude.abs(),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered income or outgo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Signed amount (positive for income, negative for outgo)
    pub amount: Money,

    pub category: String,

    #[serde(default)]
    pub subcategory: Option<String>,

    /// Sender that registered the transaction
    pub owner_id: String,

    #[serde(default)]
    pub owner_name: Option<String>,

    /// Local calendar date the transaction belongs to
    pub date: NaiveDate,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction, applying the sign convention to `magnitude`
    pub fn new(
        kind: TransactionType,
        magnitude: Money,
        category: impl Into<String>,
        owner_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            kind,
            amount: kind.signed(magnitude),
            category: category.into(),
            subcategory: None,
            owner_id: owner_id.into(),
            owner_name: None,
            date,
            created_at: Utc::now(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_outgo(&self) -> bool {
        self.kind == TransactionType::Outgo
    }

    /// `category` or `category / subcategory`
    pub fn location(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{} / {}", self.category, sub),
            None => self.category.clone(),
        }
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.category.trim().is_empty() {
            return Err(TransactionValidationError::EmptyCategory);
        }

        if !self.amount.fits_single_entry() {
            return Err(TransactionValidationError::AmountTooLarge(self.amount));
        }

        let sign_ok = match self.kind {
            TransactionType::Income => !self.amount.is_negative(),
            TransactionType::Outgo => !self.amount.is_positive(),
        };
        if !sign_ok {
            return Err(TransactionValidationError::SignMismatch {
                kind: self.kind,
                amount: self.amount,
            });
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date.format("%Y-%m-%d"),
            self.kind,
            self.location(),
            self.amount
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionValidationError {
    #[error("Transaction category cannot be empty")]
    EmptyCategory,
    #[error("Amount {0} exceeds the single entry limit")]
    AmountTooLarge(Money),
    #[error("Amount {amount} has the wrong sign for {kind}")]
    SignMismatch {
        kind: TransactionType,
        amount: Money,
    },
}
