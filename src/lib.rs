//! Campus store ordering service
//!
//! Stores sell products, students place orders against a store's catalog and
//! staff flag orders as paid or done. The ledger lives in memory and is
//! persisted to sled at shutdown.

pub mod allocator;
pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logger;
pub mod pricing;
pub mod service;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{LedgerError, StorageError};
pub use ledger::Ledger;
pub use service::LedgerService;
pub use storage::{Reconciliation, Storage};
