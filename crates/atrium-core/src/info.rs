//! The singleton `info` record — system metadata written once at install
//! time and thereafter owned by the runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::ValidationError,
  request::{BuildMetadata, InstallRequest},
};

/// The single row of the `info` table. Exactly one row ever exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
  pub version:        String,
  pub build:          u32,
  pub schema_version: String,
  pub release_date:   DateTime<Utc>,
  pub site_name:      String,
  pub site_url:       String,
  pub timezone:       Option<String>,
  /// Whether the site is live. Set at install time; toggled by the runtime.
  pub on:             bool,
  pub maintenance:    bool,
  /// Distribution channel identifier (e.g. `"stable"`).
  pub track:          String,
}

impl InfoRecord {
  /// Assemble the record for a fresh install: live, not in maintenance.
  pub fn new(request: &InstallRequest, build: &BuildMetadata) -> Self {
    Self {
      version:        build.version.clone(),
      build:          build.build,
      schema_version: build.schema_version.clone(),
      release_date:   build.release_date,
      site_name:      request.site_name.clone(),
      site_url:       request.site_url.clone(),
      timezone:       None,
      on:             true,
      maintenance:    false,
      track:          request.track.clone(),
    }
  }

  /// Field-level validation, collecting every offending field.
  pub fn validate(&self) -> Result<(), ValidationError> {
    let mut err = ValidationError::new("info");

    check_required(&mut err, "version", &self.version, 15);
    check_required(&mut err, "schema_version", &self.schema_version, 15);
    check_required(&mut err, "site_name", &self.site_name, 100);
    check_required(&mut err, "site_url", &self.site_url, 255);
    check_required(&mut err, "track", &self.track, 40);

    if let Some(tz) = &self.timezone
      && tz.chars().count() > 30
    {
      err.push("timezone", "must be at most 30 characters");
    }

    if err.is_empty() { Ok(()) } else { Err(err) }
  }
}

fn check_required(
  err: &mut ValidationError,
  field: &str,
  value: &str,
  max: usize,
) {
  if value.trim().is_empty() {
    err.push(field, "cannot be blank");
  } else if value.chars().count() > max {
    err.push(field, format!("must be at most {max} characters"));
  }
}
