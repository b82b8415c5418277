//! SQLite storage backend for the atrium installer.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Implements the storage
//! gateway plus the account, content, and settings services the installer
//! seeds through.

mod accounts;
mod content;
mod ddl;
mod store;
mod transaction;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
pub use transaction::run_in_transaction;

#[cfg(test)]
mod tests;
