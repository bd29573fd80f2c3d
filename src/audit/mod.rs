//! Audit logging system for pocket-ledger
//!
//! Records every created transaction, monthly closure and card installment
//! in an append-only audit log.
//!
//! - `AuditEntry`: a single entry with timestamp, entity information and a
//!   JSON snapshot of the record.
//! - `AuditLogger`: writes entries to the audit log file as line-delimited
//!   JSON (JSONL).
//!
//! # Example
//!
//! ```rust,ignore
//! use pocket_ledger::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(audit_log_path);
//! let entry = AuditEntry::create(
//!     EntityType::Transaction,
//!     txn.id.to_string(),
//!     Some(txn.category.clone()),
//!     &txn,
//! );
//! logger.log(&entry)?;
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType};
pub use logger::AuditLogger;
