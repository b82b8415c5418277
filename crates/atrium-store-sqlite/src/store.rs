//! [`SqliteStore`] — the SQLite implementation of the storage gateway.

use std::path::Path;

use atrium_core::{
  error::{InstallError, SaveError, SchemaError, ValidationError},
  gateway::SchemaGateway,
  info::InfoRecord,
  migration::MigrationRecord,
  schema::{SchemaDefinition, SchemaPlan},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{Error, Result, ddl, transaction::run_in_transaction};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An atrium store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(
          "PRAGMA journal_mode = WAL;\nPRAGMA foreign_keys = ON;",
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Encoding helpers ────────────────────────────────────────────────────────

/// Timestamps are stored as RFC 3339 strings.
pub(crate) fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

/// A fresh audit uid, stored as a hyphenated lowercase string.
pub(crate) fn new_uid() -> String {
  Uuid::new_v4().hyphenated().to_string()
}

// ─── SchemaGateway impl ──────────────────────────────────────────────────────

impl SchemaGateway for SqliteStore {
  async fn is_installed(&self) -> Result<bool, SchemaError> {
    self
      .conn
      .call(|conn| Ok(installed_check(conn)))
      .await
      .map_err(|e| SchemaError::Storage(e.to_string()))?
  }

  async fn apply_schema(
    &self,
    plan: &SchemaPlan,
    info: &InfoRecord,
    ledger: &[MigrationRecord],
  ) -> Result<(), InstallError> {
    let plan = plan.clone();
    let info = info.clone();
    let ledger = ledger.to_vec();

    self
      .conn
      .call(move |conn| Ok(apply(conn, &plan, &info, &ledger)))
      .await
      .map_err(|e| InstallError::Storage(e.to_string()))?
  }

  async fn add_locale(
    &self,
    locale: &str,
    sort_order: i64,
  ) -> Result<(), SaveError> {
    let locale = locale.to_string();
    self
      .conn
      .call(move |conn| Ok(insert_locale(conn, &locale, sort_order)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }
}

fn installed_check(
  conn: &rusqlite::Connection,
) -> Result<bool, SchemaError> {
  let has_table: bool = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'info'",
      [],
      |_| Ok(true),
    )
    .optional()
    .map_err(storage)?
    .unwrap_or(false);

  if !has_table {
    return Ok(false);
  }

  let rows: i64 = conn
    .query_row("SELECT COUNT(*) FROM \"info\"", [], |row| row.get(0))
    .map_err(storage)?;
  Ok(rows > 0)
}

fn storage(e: rusqlite::Error) -> SchemaError {
  SchemaError::Storage(e.to_string())
}

// ─── The atomic region ───────────────────────────────────────────────────────

/// Tables first, then indexes, then the info row and the migration ledger —
/// all inside one transaction (unless an outer one is already open).
fn apply(
  conn: &mut rusqlite::Connection,
  plan: &SchemaPlan,
  info: &InfoRecord,
  ledger: &[MigrationRecord],
) -> Result<(), InstallError> {
  run_in_transaction(conn, |tx| {
    for def in plan.tables() {
      tracing::debug!(table = %def.table, "creating table");
      tx.execute_batch(&ddl::create_table_sql(def))
        .map_err(|e| ddl_error(def, e))?;
    }

    for def in plan.tables() {
      for statement in ddl::index_statements(def) {
        tx.execute_batch(&statement).map_err(|e| ddl_error(def, e))?;
      }
    }

    insert_info(tx, info)?;
    insert_ledger(tx, ledger)?;
    Ok(())
  })
}

fn ddl_error(def: &SchemaDefinition, e: rusqlite::Error) -> InstallError {
  SchemaError::Ddl { table: def.table.clone(), message: e.to_string() }.into()
}

fn insert_info(
  tx: &rusqlite::Connection,
  info: &InfoRecord,
) -> Result<(), InstallError> {
  let now = encode_dt(Utc::now());
  tx.execute(
    "INSERT INTO \"info\"
       (\"version\", \"build\", \"schema_version\", \"release_date\",
        \"site_name\", \"site_url\", \"timezone\", \"on\", \"maintenance\",
        \"track\", \"date_created\", \"date_updated\", \"uid\")
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    rusqlite::params![
      info.version,
      info.build,
      info.schema_version,
      encode_dt(info.release_date),
      info.site_name,
      info.site_url,
      info.timezone,
      info.on,
      info.maintenance,
      info.track,
      now,
      now,
      new_uid(),
    ],
  )
  .map_err(|e| {
    InstallError::from(ValidationError::single("info", "record", e.to_string()))
  })
  .map(|_| ())
}

/// A partially-seeded ledger must never be committed: the upgrade runner
/// treats ledger presence as proof a migration already ran. Any failure here
/// aborts the enclosing transaction.
fn insert_ledger(
  tx: &rusqlite::Connection,
  ledger: &[MigrationRecord],
) -> Result<(), InstallError> {
  for record in ledger {
    let now = encode_dt(Utc::now());
    tx.execute(
      "INSERT INTO \"migrations\"
         (\"version\", \"apply_time\", \"date_created\", \"date_updated\",
          \"uid\")
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        record.version,
        encode_dt(record.apply_time),
        now,
        now,
        new_uid(),
      ],
    )
    .map_err(|e| {
      InstallError::from(ValidationError::single(
        "migration",
        "version",
        e.to_string(),
      ))
    })?;
  }
  Ok(())
}

fn insert_locale(
  conn: &rusqlite::Connection,
  locale: &str,
  sort_order: i64,
) -> Result<(), SaveError> {
  let now = encode_dt(Utc::now());
  conn
    .execute(
      "INSERT INTO \"locales\"
         (\"locale\", \"sort_order\", \"date_created\", \"date_updated\",
          \"uid\")
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![locale, sort_order, now, now, new_uid()],
    )
    .map(|_| ())
    .map_err(|e| SaveError::Storage(e.to_string()))
}
