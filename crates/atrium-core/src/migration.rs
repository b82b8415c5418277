//! Migration-ledger rows.
//!
//! The ledger records which upgrade scripts have already run. The installer
//! seeds it so a fresh install is indistinguishable, to the upgrade runner,
//! from a system that has applied every historical migration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `migrations` table. Versions are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
  pub version:    String,
  pub apply_time: DateTime<Utc>,
}

impl MigrationRecord {
  pub fn new(version: impl Into<String>, apply_time: DateTime<Utc>) -> Self {
    Self { version: version.into(), apply_time }
  }
}
