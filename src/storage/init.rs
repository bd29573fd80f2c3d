//! Storage initialization
//!
//! Handles first-run setup: directories and empty data files.

use crate::config::paths::LedgerPaths;
use crate::error::LedgerError;

use super::card_purchases::CardPurchaseData;
use super::closures::ClosureData;
use super::file_io::write_json_atomic;
use super::transactions::TransactionData;

/// Initialize storage for a fresh installation
///
/// Existing data files are left untouched.
pub fn initialize_storage(paths: &LedgerPaths) -> Result<(), LedgerError> {
    paths.ensure_directories()?;

    if !paths.transactions_file().exists() {
        write_json_atomic(paths.transactions_file(), &TransactionData::default())?;
    }
    if !paths.closures_file().exists() {
        write_json_atomic(paths.closures_file(), &ClosureData::default())?;
    }
    if !paths.card_purchases_file().exists() {
        write_json_atomic(paths.card_purchases_file(), &CardPurchaseData::default())?;
    }

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &LedgerPaths) -> bool {
    !paths.transactions_file().exists()
        || !paths.closures_file().exists()
        || !paths.card_purchases_file().exists()
}
