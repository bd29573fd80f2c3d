//! Storage layer for pocket-ledger
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. Each repository persists while holding its own write lock and
//! an advisory lock on the data file, so a check followed by an insert is
//! never interleaved with another writer, in this process or another one.

pub mod card_purchases;
pub mod closures;
pub mod file_io;
pub mod init;
pub mod lock;
pub mod transactions;

pub use card_purchases::CardPurchaseRepository;
pub use closures::{ClosureInsert, ClosureRepository};
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use transactions::TransactionRepository;

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::LedgerPaths;
use crate::error::LedgerError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    pub transactions: TransactionRepository,
    pub closures: ClosureRepository,
    pub card_purchases: CardPurchaseRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: LedgerPaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        Ok(Self {
            transactions: TransactionRepository::new(paths.transactions_file()),
            closures: ClosureRepository::new(paths.closures_file()),
            card_purchases: CardPurchaseRepository::new(paths.card_purchases_file()),
            audit: AuditLogger::new(paths.audit_log()),
        })
    }

    /// Get the audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), LedgerError> {
        self.refresh()
    }

    /// Re-read every data file, picking up rows other processes wrote
    pub fn refresh(&self) -> Result<(), LedgerError> {
        self.transactions.load()?;
        self.closures.load()?;
        self.card_purchases.load()?;
        Ok(())
    }

    /// Record the creation of an entity in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), LedgerError> {
        let entry = AuditEntry::create(entity_type, entity_id, entity_name, entity);
        self.audit.log(&entry)
    }

    /// Record the creation of several entities with a single flush
    pub fn log_create_batch<T: Serialize>(
        &self,
        entity_type: EntityType,
        entities: &[(String, Option<String>, T)],
    ) -> Result<(), LedgerError> {
        let entries: Vec<AuditEntry> = entities
            .iter()
            .map(|(id, name, entity)| AuditEntry::create(entity_type, id.clone(), name.clone(), entity))
            .collect();
        self.audit.log_batch(&entries)
    }
}
