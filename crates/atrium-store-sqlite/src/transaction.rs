//! The transaction coordinator.
//!
//! One atomic region per installation run covers all DDL, the info row, and
//! the migration ledger. The coordinator is reentrant: when the connection
//! already has an open transaction, an outer process owns commit and
//! rollback entirely, and failures simply propagate upward.

use atrium_core::error::SchemaError;

/// Run `work` atomically.
///
/// If no transaction is active on `conn`, one is opened around `work`:
/// committed on success, rolled back on any error (the
/// [`rusqlite::Transaction`] guard rolls back when dropped on the error
/// path). If a transaction is already active, `work` runs inside it and
/// this function neither commits nor rolls back.
pub fn run_in_transaction<T, E>(
  conn: &mut rusqlite::Connection,
  work: impl FnOnce(&rusqlite::Connection) -> Result<T, E>,
) -> Result<T, E>
where
  E: From<SchemaError>,
{
  if !conn.is_autocommit() {
    return work(conn);
  }

  let tx = conn
    .transaction()
    .map_err(|e| SchemaError::Storage(e.to_string()))?;
  let value = work(&tx)?;
  tx.commit()
    .map_err(|e| SchemaError::Storage(e.to_string()))?;
  Ok(value)
}
