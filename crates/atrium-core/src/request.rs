//! Installation inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the caller supplies for one installation run. Immutable for
/// the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRequest {
  /// Primary locale code (e.g. `"en_us"`).
  pub locale:      String,
  pub site_name:   String,
  pub site_url:    String,
  pub email:       String,
  pub username:    String,
  pub password:    String,
  /// Distribution channel identifier.
  pub track:       String,
  /// Whether a person is driving the install. Headless invocations skip the
  /// post-install session step.
  pub interactive: bool,
}

/// Build metadata supplied by the hosting runtime, not by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildMetadata {
  pub version:        String,
  pub build:          u32,
  pub schema_version: String,
  pub release_date:   DateTime<Utc>,
}

impl BuildMetadata {
  /// A fixed build stamp for tests.
  pub fn for_tests() -> Self {
    Self {
      version:        "0.1.0".to_string(),
      build:          1000,
      schema_version: "1.0.0".to_string(),
      release_date:   DateTime::parse_from_rfc3339("2026-01-15T00:00:00Z")
        .expect("valid release date")
        .with_timezone(&Utc),
    }
  }
}
