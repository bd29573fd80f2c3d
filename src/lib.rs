//! pocket-ledger - personal finance ledger driven by chat commands
//!
//! Short free-text commands (`gasto 500 comida`, `tarjeta 3000 TiendaX 3`)
//! register income and outgo, close months and schedule credit card
//! installments. Every command produces a reply string for the messaging
//! transport.
//!
//! # Architecture
//!
//! - `bot`: command routing and the transport boundary
//! - `services`: ledger, monthly closure, card scheduling and filter parsing
//! - `models`: transactions, closures, card installments, money and periods
//! - `storage`: JSON file repositories with atomic writes
//! - `audit`: append-only record of every created entity
//! - `config`: paths and user settings
//! - `logging`: operator log files
//! - `error`: custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use pocket_ledger::bot::{CallerContext, CommandRouter};
//! use pocket_ledger::config::paths::LedgerPaths;
//! use pocket_ledger::storage::Storage;
//!
//! let mut storage = Storage::new(LedgerPaths::new()?)?;
//! storage.load_all()?;
//!
//! let router = CommandRouter::new(&storage);
//! let caller = CallerContext::new("200213027", None);
//! println!("{}", router.handle("gasto 500 servicios metrogas", &caller));
//! ```

pub mod audit;
pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::LedgerError;
