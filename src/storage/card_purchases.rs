//! Credit card purchase repository for JSON storage
//!
//! Installments of one purchase are written as a batch: either every row
//! lands on disk or none of them stays in the repository. The batch is
//! appended to a fresh read of the file taken under its cross-process lock.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{CreditCardPurchase, MonthPeriod};

use super::file_io::{read_json, write_json_atomic};
use super::lock::FileLock;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(super) struct CardPurchaseData {
    purchases: Vec<CreditCardPurchase>,
}

/// Repository for credit card installments
pub struct CardPurchaseRepository {
    path: PathBuf,
    data: RwLock<Vec<CreditCardPurchase>>,
}

impl CardPurchaseRepository {
    /// Create a new card purchase repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Vec::new()),
        }
    }

    /// Load purchases from disk
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: CardPurchaseData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = file_data.purchases;

        Ok(())
    }

    /// Append all installments of one purchase and persist them together
    pub fn insert_batch(&self, rows: Vec<CreditCardPurchase>) -> Result<(), LedgerError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let _lock = FileLock::acquire(&self.path)?;

        let mut file_data: CardPurchaseData = read_json(&self.path)?;
        file_data.purchases.extend(rows);
        write_json_atomic(&self.path, &file_data)?;

        *data = file_data.purchases;
        Ok(())
    }

    /// Get installments charged to a billing cycle, newest purchase first
    pub fn get_by_cycle(
        &self,
        cycle: MonthPeriod,
    ) -> Result<Vec<CreditCardPurchase>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut purchases: Vec<_> = data
            .iter()
            .filter(|p| p.billing_cycle == cycle)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(purchases)
    }

    /// Count all stored installments
    pub fn count(&self) -> Result<usize, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
