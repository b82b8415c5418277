//! Error types for `atrium-core`.
//!
//! The installation run distinguishes three fatal failure classes
//! (already-installed guard, DDL failure, record validation failure) from
//! advisory failures, which are never raised — they are collected as
//! warnings on the install report instead.

use thiserror::Error;

// ─── Field-level validation ──────────────────────────────────────────────────

/// One failed validation rule on one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

/// A persisted record failed field-level validation.
///
/// Carries every offending field, not just the first one, so the caller can
/// report the full list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("there was a problem saving the {record} record:{}", flatten(.errors))]
pub struct ValidationError {
  /// Which record failed (e.g. `"info"`, `"user"`, `"migration"`).
  pub record: String,
  pub errors: Vec<FieldError>,
}

impl ValidationError {
  pub fn new(record: impl Into<String>) -> Self {
    Self { record: record.into(), errors: Vec::new() }
  }

  pub fn single(
    record: impl Into<String>,
    field: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    let mut err = Self::new(record);
    err.push(field, message);
    err
  }

  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self
      .errors
      .push(FieldError { field: field.into(), message: message.into() });
  }

  pub fn is_empty(&self) -> bool { self.errors.is_empty() }

  /// One `"\n - field: message"` line per failed field.
  pub fn flattened(&self) -> String { flatten(&self.errors) }
}

fn flatten(errors: &[FieldError]) -> String {
  errors
    .iter()
    .map(|e| format!("\n - {}: {}", e.field, e.message))
    .collect()
}

// ─── Schema construction ─────────────────────────────────────────────────────

/// A failure while assembling or applying the schema plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
  #[error("duplicate table name in schema plan: {0}")]
  DuplicateTable(String),

  #[error("foreign key {table}.{column} references unknown table {target}")]
  UnknownForeignKeyTarget {
    table:  String,
    column: String,
    target: String,
  },

  #[error("foreign key on {table} names unknown column {column}")]
  UnknownForeignKeyColumn { table: String, column: String },

  #[error("DDL failed for table {table}: {message}")]
  Ddl { table: String, message: String },

  #[error("storage error: {0}")]
  Storage(String),
}

// ─── Save contract ───────────────────────────────────────────────────────────

/// Failure of the uniform `save(entity)` contract exposed by the collaborator
/// services. Validation failures carry per-field messages; everything else is
/// a storage-level failure.
#[derive(Debug, Error)]
pub enum SaveError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("storage error: {0}")]
  Storage(String),
}

// ─── Install run ─────────────────────────────────────────────────────────────

/// Fatal outcome of an installation run.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error("atrium is already installed")]
  AlreadyInstalled,

  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("storage error: {0}")]
  Storage(String),
}

impl From<SaveError> for InstallError {
  fn from(err: SaveError) -> Self {
    match err {
      SaveError::Validation(v) => Self::Validation(v),
      SaveError::Storage(m) => Self::Storage(m),
    }
  }
}

pub type Result<T, E = InstallError> = std::result::Result<T, E>;
