//! Configuration module for pocket-ledger
//!
//! This module provides configuration management including:
//! - Path resolution for data, logs and settings
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::Settings;
