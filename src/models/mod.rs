//! Core data models for pocket-ledger
//!
//! This module contains the data structures of the ledger domain:
//! transactions, monthly closures, credit card installments and the
//! calendar periods they are grouped by.

pub mod card;
pub mod closure;
pub mod ids;
pub mod money;
pub mod period;
pub mod transaction;

pub use card::CreditCardPurchase;
pub use closure::MonthlyClosure;
pub use ids::{ClosureId, PurchaseId, TransactionId};
pub use money::Money;
pub use period::MonthPeriod;
pub use transaction::{Transaction, TransactionType};
