//! Trait seams between the installation orchestrator and its collaborators.
//!
//! The orchestrator takes these by explicit injection, so every collaborator
//! is independently substitutable for testing. All methods return `Send`
//! futures so the traits can be used in multi-threaded async runtimes.

use std::future::Future;

use serde_json::Value;

use crate::{
  content::{
    EntryType, Field, FieldGroup, NewEntry, NewUser, SavedSection, Section,
    Session, TagGroup, User,
  },
  error::{InstallError, SaveError, SchemaError},
  info::InfoRecord,
  migration::MigrationRecord,
  schema::SchemaPlan,
};

// ─── Storage gateway ─────────────────────────────────────────────────────────

/// The storage backend the installer builds the schema through.
pub trait SchemaGateway: Send + Sync {
  /// Whether the target store already holds an installed system
  /// (the `info` table exists and has its row).
  fn is_installed(
    &self,
  ) -> impl Future<Output = Result<bool, SchemaError>> + Send + '_;

  /// Apply the whole plan — tables, indexes, foreign keys — and write the
  /// info row and the migration ledger, all in one atomic region. Any
  /// failure rolls back every change made by this call.
  fn apply_schema<'a>(
    &'a self,
    plan: &'a SchemaPlan,
    info: &'a InfoRecord,
    ledger: &'a [MigrationRecord],
  ) -> impl Future<Output = Result<(), InstallError>> + Send + 'a;

  /// Insert one locale row. Runs after commit; failures are advisory.
  fn add_locale<'a>(
    &'a self,
    locale: &'a str,
    sort_order: i64,
  ) -> impl Future<Output = Result<(), SaveError>> + Send + 'a;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// User persistence and session establishment.
pub trait AccountService: Send + Sync {
  /// Validate and persist a user. Validation failures carry one message per
  /// offending field.
  fn save_user<'a>(
    &'a self,
    user: &'a NewUser,
  ) -> impl Future<Output = Result<User, SaveError>> + Send + 'a;

  /// Verify credentials and establish a session.
  fn login<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Session, SaveError>> + Send + 'a;
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// The catalog services consumed by the default-content seeding pass. Every
/// method follows the uniform save contract: ok with the persisted identity,
/// or a [`SaveError`] the caller may treat as advisory.
pub trait ContentService: Send + Sync {
  fn save_tag_group<'a>(
    &'a self,
    group: &'a TagGroup,
  ) -> impl Future<Output = Result<i64, SaveError>> + Send + 'a;

  fn save_field_group<'a>(
    &'a self,
    group: &'a FieldGroup,
  ) -> impl Future<Output = Result<i64, SaveError>> + Send + 'a;

  fn save_field<'a>(
    &'a self,
    field: &'a Field,
  ) -> impl Future<Output = Result<i64, SaveError>> + Send + 'a;

  fn save_section<'a>(
    &'a self,
    section: &'a Section,
  ) -> impl Future<Output = Result<SavedSection, SaveError>> + Send + 'a;

  fn save_entry_type<'a>(
    &'a self,
    entry_type: &'a EntryType,
  ) -> impl Future<Output = Result<(), SaveError>> + Send + 'a;

  fn save_entry<'a>(
    &'a self,
    entry: &'a NewEntry,
  ) -> impl Future<Output = Result<i64, SaveError>> + Send + 'a;
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// Namespaced settings persistence (e.g. the `email` namespace).
pub trait SettingsService: Send + Sync {
  fn save_settings<'a>(
    &'a self,
    category: &'a str,
    settings: &'a Value,
  ) -> impl Future<Output = Result<(), SaveError>> + Send + 'a;
}
