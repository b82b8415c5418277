//! Error type for `atrium-store-sqlite`.
//!
//! Most of this crate's surface returns the core error taxonomy
//! ([`atrium_core::error`]) required by the gateway and service contracts;
//! this type only covers opening and initialising the store itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
