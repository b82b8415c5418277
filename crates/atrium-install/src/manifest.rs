//! The migration manifest.
//!
//! An explicit, reviewable list of migration versions — no directory
//! enumeration, so ordering never depends on the filesystem. The installer
//! seeds the ledger from it so a fresh install reports "fully migrated."

use atrium_core::{error::ValidationError, migration::MigrationRecord};
use chrono::{DateTime, Utc};

/// The ledger marker representing everything before versioned migrations
/// existed.
pub const BASELINE_VERSION: &str = "m000000_000000_base";

/// The ordered set of migration versions known to this build.
#[derive(Debug, Clone, Default)]
pub struct MigrationManifest {
  versions: Vec<String>,
}

impl MigrationManifest {
  /// A manifest with no versioned migrations — the shipped state of a fresh
  /// platform release. The baseline marker is always seeded regardless.
  pub fn empty() -> Self { Self::default() }

  /// Build a manifest from declared migration names.
  ///
  /// Names must have the `mNNNNNN_NNNNNN_description` shape. The list is
  /// sorted lexicographically (which orders by date/time prefix) and must be
  /// free of duplicates.
  pub fn from_names<I, S>(names: I) -> Result<Self, ValidationError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut versions: Vec<String> = names.into_iter().map(Into::into).collect();
    versions.sort();

    let mut err = ValidationError::new("migration");
    for (i, version) in versions.iter().enumerate() {
      if !is_valid_version(version) {
        err.push("version", format!("{version:?} is not a migration name"));
      }
      if i > 0 && versions[i - 1] == *version {
        err.push("version", format!("{version:?} is listed more than once"));
      }
    }

    if err.is_empty() { Ok(Self { versions }) } else { Err(err) }
  }

  pub fn versions(&self) -> &[String] { &self.versions }

  /// The ledger rows to seed: the baseline marker first, then one row per
  /// manifest entry, all stamped with the same instant so the baseline is
  /// never later than any other row.
  pub fn ledger(
    &self,
    now: DateTime<Utc>,
  ) -> Result<Vec<MigrationRecord>, ValidationError> {
    if self.versions.iter().any(|v| v == BASELINE_VERSION) {
      return Err(ValidationError::single(
        "migration",
        "version",
        format!("{BASELINE_VERSION:?} is reserved for the baseline marker"),
      ));
    }

    let mut ledger = Vec::with_capacity(self.versions.len() + 1);
    ledger.push(MigrationRecord::new(BASELINE_VERSION, now));
    for version in &self.versions {
      ledger.push(MigrationRecord::new(version.clone(), now));
    }
    Ok(ledger)
  }
}

/// `mNNNNNN_NNNNNN_description` — six digits, six digits, non-empty suffix.
fn is_valid_version(name: &str) -> bool {
  let Some(rest) = name.strip_prefix('m') else { return false };
  let bytes = rest.as_bytes();
  if bytes.len() < 15 {
    return false;
  }
  bytes[..6].iter().all(u8::is_ascii_digit)
    && bytes[6] == b'_'
    && bytes[7..13].iter().all(u8::is_ascii_digit)
    && bytes[13] == b'_'
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_names_sorts_lexicographically() {
    let manifest = MigrationManifest::from_names([
      "m140204_000002_add_tags",
      "m131205_000001_rename_handles",
    ])
    .unwrap();

    assert_eq!(manifest.versions(), [
      "m131205_000001_rename_handles",
      "m140204_000002_add_tags",
    ]);
  }

  #[test]
  fn from_names_rejects_bad_shapes_and_duplicates() {
    let err = MigrationManifest::from_names([
      "m140204_000002_add_tags",
      "m140204_000002_add_tags",
      "add_tags",
    ])
    .unwrap_err();

    assert_eq!(err.record, "migration");
    assert_eq!(err.errors.len(), 2);
  }

  #[test]
  fn ledger_puts_the_baseline_first() {
    let manifest =
      MigrationManifest::from_names(["m140204_000002_add_tags"]).unwrap();
    let ledger = manifest.ledger(Utc::now()).unwrap();

    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].version, BASELINE_VERSION);
    assert!(ledger[0].apply_time <= ledger[1].apply_time);
  }

  #[test]
  fn ledger_rejects_a_manifest_claiming_the_baseline() {
    let manifest =
      MigrationManifest::from_names([BASELINE_VERSION]).unwrap();
    assert!(manifest.ledger(Utc::now()).is_err());
  }
}
