//! Business logic layer for pocket-ledger
//!
//! Each service borrows the `Storage` for the duration of one command and
//! returns `LedgerResult` values whose user-facing errors carry the reply
//! text.

pub mod closure;
pub mod credit_card;
pub mod filter;
pub mod ledger;

pub use closure::ClosureService;
pub use credit_card::{CreditCardScheduler, PurchaseSummary};
pub use filter::{FilterCriteria, FilterError, FilterValidator};
pub use ledger::{BalanceSummary, CategoryTotal, TransactionLedger, TransactionSummary};

use log::error;

use crate::error::LedgerError;

/// Log a persistence failure for the operator and hide it behind `reply`
pub(crate) fn internal_error(context: &str, err: LedgerError, reply: &str) -> LedgerError {
    error!("{}: {}", context, err);
    LedgerError::Internal(reply.to_string())
}

/// Log a total that left the `Money` range and hide it behind `reply`
pub(crate) fn overflow_error(context: &str, reply: &str) -> LedgerError {
    error!("{}: total out of range", context);
    LedgerError::Internal(reply.to_string())
}
