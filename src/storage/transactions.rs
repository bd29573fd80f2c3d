//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json. Rows are
//! append-only and kept in insertion order. Appends reload the file under
//! its cross-process lock first.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{MonthPeriod, Transaction};

use super::file_io::{read_json, write_json_atomic};
use super::lock::FileLock;

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(super) struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<Vec<Transaction>>,
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Vec::new()),
        }
    }

    /// Load transactions from disk
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = file_data.transactions;

        Ok(())
    }

    /// Append a transaction and persist it
    ///
    /// Memory only changes once the file write succeeded.
    pub fn insert(&self, txn: Transaction) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let _lock = FileLock::acquire(&self.path)?;

        let mut file_data: TransactionData = read_json(&self.path)?;
        file_data.transactions.push(txn);
        write_json_atomic(&self.path, &file_data)?;

        *data = file_data.transactions;
        Ok(())
    }

    /// Get all transactions in insertion order
    pub fn get_all(&self) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.clone())
    }

    /// Get transactions dated within a month, oldest first
    pub fn get_by_period(&self, period: MonthPeriod) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut transactions: Vec<_> = data
            .iter()
            .filter(|t| period.contains(t.date))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(transactions)
    }

    /// Count all transactions
    pub fn count(&self) -> Result<usize, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
