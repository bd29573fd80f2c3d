//! Monthly closure service
//!
//! Closing a month snapshots its income, outgo and balance. A month is closed
//! at most once: later calls return the stored snapshot even if transactions
//! for that month were registered afterwards.

use log::{info, warn};

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{MonthPeriod, MonthlyClosure};
use crate::storage::{ClosureInsert, Storage};

use super::internal_error;
use super::ledger::TransactionLedger;

const CLOSE_FAILED: &str = "Ocurrió un error al cerrar el mes.";

/// Service for monthly closures
pub struct ClosureService<'a> {
    storage: &'a Storage,
}

impl<'a> ClosureService<'a> {
    /// Create a new closure service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Close `month` of `year`, or return the existing closure
    pub fn close_month(&self, month: u32, year: i32) -> LedgerResult<MonthlyClosure> {
        let period = MonthPeriod::new(year, month)
            .map_err(|_| LedgerError::InvalidMonth(format!("Mes inválido: {}", month)))?;

        if let Some(existing) = self
            .storage
            .closures
            .get(month, year)
            .map_err(|e| internal_error("Failed to read closures", e, CLOSE_FAILED))?
        {
            return Ok(existing);
        }

        // totals must include rows other processes wrote since startup
        self.storage
            .transactions
            .load()
            .map_err(|e| internal_error("Failed to reload transactions", e, CLOSE_FAILED))?;
        let totals = TransactionLedger::new(self.storage).balance(period)?;
        let closure = MonthlyClosure::from_totals(period, totals.income, -totals.outgo);

        let outcome = self
            .storage
            .closures
            .insert_if_absent(closure)
            .map_err(|e| internal_error("Failed to store closure", e, CLOSE_FAILED))?;

        if let ClosureInsert::Inserted(created) = &outcome {
            info!("Closed {} with balance {}", period, created.balance);
            if let Err(e) = self.storage.log_create(
                EntityType::MonthlyClosure,
                created.id.to_string(),
                Some(period.to_string()),
                created,
            ) {
                warn!("Failed to audit closure {}: {}", period, e);
            }
        }

        Ok(outcome.into_inner())
    }

    /// All closures, most recent month first
    pub fn list(&self) -> LedgerResult<Vec<MonthlyClosure>> {
        self.storage
            .closures
            .get_all()
            .map_err(|e| internal_error("Failed to read closures", e, CLOSE_FAILED))
    }
}
