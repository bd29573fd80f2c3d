//! Audit entry data structures
//!
//! Ledger records are append-only, so every audit entry describes the
//! creation of one record together with a JSON snapshot of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Transaction,
    MonthlyClosure,
    CardPurchase,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Transaction => write!(f, "Transaction"),
            EntityType::MonthlyClosure => write!(f, "MonthlyClosure"),
            EntityType::CardPurchase => write!(f, "CardPurchase"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the record was created (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of entity created
    pub entity_type: EntityType,

    /// ID of the created entity
    pub entity_id: String,

    /// Human-readable description (category, vendor, period)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// JSON representation of the entity as written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Create a new audit entry for a created record
    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            snapshot: serde_json::to_value(entity).ok(),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] CREATE {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        output
    }
}
