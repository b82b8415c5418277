//! atrium-setup binary.
//!
//! Reads `atrium.toml` (or the path given with `--config`), opens the
//! SQLite store, and runs the installer once. Headless by definition, so
//! the post-install session step is skipped.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use atrium_core::request::{BuildMetadata, InstallRequest};
use atrium_install::{Installer, MigrationManifest, Registry};
use atrium_store_sqlite::SqliteStore;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Install the atrium platform")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "atrium.toml")]
  config: PathBuf,

  /// Administrator password. Prompted on stdin when omitted.
  #[arg(long)]
  password: Option<String>,
}

/// Setup configuration, deserialised from `atrium.toml` and `ATRIUM_*`
/// environment variables.
#[derive(Deserialize, Clone)]
struct SetupConfig {
  store_path: PathBuf,
  locale:     String,
  site_name:  String,
  site_url:   String,
  email:      String,
  username:   String,
  #[serde(default = "default_track")]
  track:      String,
}

fn default_track() -> String { "stable".to_string() }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ATRIUM"))
    .build()
    .context("failed to read config file")?;

  let setup: SetupConfig = settings
    .try_deserialize()
    .context("failed to deserialise SetupConfig")?;

  let password = match cli.password {
    Some(password) => password,
    None => prompt_password()?,
  };

  let store = SqliteStore::open(&setup.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", setup.store_path)
    })?;
  let store = Arc::new(store);
  tracing::info!(store = ?setup.store_path, "store opened");

  let installer = Installer::new(
    store.clone(),
    store.clone(),
    store.clone(),
    store,
    Registry::platform(),
    MigrationManifest::empty(),
    build_metadata(),
  );

  let request = InstallRequest {
    locale: setup.locale,
    site_name: setup.site_name,
    site_url: setup.site_url,
    email: setup.email,
    username: setup.username,
    password,
    track: setup.track,
    interactive: false,
  };

  let report = installer.run(&request).await.context("installation failed")?;

  println!("Installed {} at {}", request.site_name, request.site_url);
  if !report.warnings.is_empty() {
    println!("Completed with warnings:");
    for warning in &report.warnings {
      println!("  - {}: {}", warning.step, warning.message);
    }
  }

  Ok(())
}

/// Build metadata baked in by the hosting runtime.
fn build_metadata() -> BuildMetadata {
  BuildMetadata {
    version:        env!("CARGO_PKG_VERSION").to_string(),
    build:          1000,
    schema_version: "1.0.0".to_string(),
    release_date:   DateTime::parse_from_rfc3339("2026-01-15T00:00:00Z")
      .expect("valid release date")
      .with_timezone(&Utc),
  }
}

/// Read a password from stdin.
fn prompt_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Administrator password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
