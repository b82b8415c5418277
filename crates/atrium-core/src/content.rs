//! Models for the records the installer seeds after the schema commits:
//! the administrator account and the default content catalog.
//!
//! These are thin input/output envelopes for the uniform save contract —
//! the domain services own the full models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Input to [`AccountService::save_user`](crate::gateway::AccountService).
/// The password is plaintext here; the service hashes it before persisting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub email:    String,
  pub password: String,
  pub admin:    bool,
}

/// A persisted user. The password never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:       i64,
  pub username: String,
  pub email:    String,
  pub admin:    bool,
}

/// An authenticated session established for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub id:      i64,
  pub user_id: i64,
  pub token:   String,
}

// ─── Fields and tags ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagGroup {
  pub name:   String,
  pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldGroup {
  pub name: String,
}

/// A content field. `settings` is a free-form JSON blob whose shape is owned
/// by the field type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
  /// The owning field group; `None` when an earlier group save failed — the
  /// service rejects it with a validation error rather than a panic.
  pub group_id:     Option<i64>,
  pub name:         String,
  pub handle:       String,
  pub field_type:   String,
  pub translatable: bool,
  pub settings:     Value,
}

// ─── Sections and entries ────────────────────────────────────────────────────

/// Whether a section holds exactly one entry or a stream of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
  Single,
  Channel,
}

impl SectionKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Single => "single",
      Self::Channel => "channel",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionLocale {
  pub locale:     String,
  pub url_format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
  pub name:     String,
  pub handle:   String,
  pub kind:     SectionKind,
  pub has_urls: bool,
  pub template: Option<String>,
  pub locales:  Vec<SectionLocale>,
}

/// What a section save produced: the section row, its auto-created default
/// entry type, and — for single sections — the one entry that exists from
/// birth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSection {
  pub id:            i64,
  pub entry_type_id: i64,
  pub entry_id:      Option<i64>,
}

/// Layout and title configuration for a section's entry type. Saving updates
/// the auto-created default type in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryType {
  pub id:              i64,
  pub section_id:      i64,
  pub name:            String,
  pub has_title_field: bool,
  pub title_label:     String,
  /// Field ids in layout order.
  pub field_layout:    Vec<i64>,
}

/// Input to `save_entry`. With `id` set, the save updates the content of an
/// existing entry (e.g. the auto-created single-section entry); otherwise a
/// new element/entry pair is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
  pub id:         Option<i64>,
  pub section_id: i64,
  pub type_id:    i64,
  pub author_id:  Option<i64>,
  pub locale:     String,
  pub title:      String,
  /// Field handle → rendered value. Handles without a backing content column
  /// are skipped with a warning, not an error.
  pub content:    Vec<(String, String)>,
  pub enabled:    bool,
}
