//! Content catalog and settings persistence for the post-install seeding
//! pass: tag groups, field groups, fields, sections, entry types, entries,
//! and namespaced settings.

use atrium_core::{
  content::{
    EntryType, Field, FieldGroup, NewEntry, SavedSection, Section,
    SectionKind, TagGroup,
  },
  error::{SaveError, ValidationError},
  gateway::{ContentService, SettingsService},
};
use chrono::Utc;

use crate::{
  accounts::conflict,
  ddl::quote,
  store::{SqliteStore, encode_dt, new_uid},
};

impl ContentService for SqliteStore {
  async fn save_tag_group(&self, group: &TagGroup) -> Result<i64, SaveError> {
    let mut err = ValidationError::new("tag_group");
    check_name(&mut err, &group.name);
    check_handle(&mut err, &group.handle);
    err.into_result()?;

    let group = group.clone();
    self
      .conn
      .call(move |conn| Ok(insert_tag_group(conn, &group)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }

  async fn save_field_group(
    &self,
    group: &FieldGroup,
  ) -> Result<i64, SaveError> {
    let mut err = ValidationError::new("field_group");
    check_name(&mut err, &group.name);
    err.into_result()?;

    let group = group.clone();
    self
      .conn
      .call(move |conn| Ok(insert_field_group(conn, &group)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }

  async fn save_field(&self, field: &Field) -> Result<i64, SaveError> {
    let mut err = ValidationError::new("field");
    if field.group_id.is_none() {
      err.push("group", "is required");
    }
    check_name(&mut err, &field.name);
    check_handle(&mut err, &field.handle);
    err.into_result()?;

    let field = field.clone();
    self
      .conn
      .call(move |conn| Ok(insert_field(conn, &field)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }

  async fn save_section(
    &self,
    section: &Section,
  ) -> Result<SavedSection, SaveError> {
    let mut err = ValidationError::new("section");
    check_name(&mut err, &section.name);
    check_handle(&mut err, &section.handle);
    if section.locales.is_empty() {
      err.push("locales", "must include at least one locale");
    }
    err.into_result()?;

    let section = section.clone();
    self
      .conn
      .call(move |conn| Ok(insert_section(conn, &section)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }

  async fn save_entry_type(
    &self,
    entry_type: &EntryType,
  ) -> Result<(), SaveError> {
    let entry_type = entry_type.clone();
    self
      .conn
      .call(move |conn| Ok(update_entry_type(conn, &entry_type)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }

  async fn save_entry(&self, entry: &NewEntry) -> Result<i64, SaveError> {
    let mut err = ValidationError::new("entry");
    if entry.title.trim().is_empty() {
      err.push("title", "cannot be blank");
    }
    err.into_result()?;

    let entry = entry.clone();
    self
      .conn
      .call(move |conn| Ok(upsert_entry(conn, &entry)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }
}

impl SettingsService for SqliteStore {
  async fn save_settings(
    &self,
    category: &str,
    settings: &serde_json::Value,
  ) -> Result<(), SaveError> {
    let mut err = ValidationError::new("settings");
    if category.trim().is_empty() {
      err.push("category", "cannot be blank");
    } else if category.chars().count() > 15 {
      err.push("category", "must be at most 15 characters");
    }
    err.into_result()?;

    let category = category.to_string();
    let serialized = settings.to_string();
    self
      .conn
      .call(move |conn| Ok(insert_settings(conn, &category, &serialized)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }
}

// ─── Validation helpers ──────────────────────────────────────────────────────

trait IntoResult {
  fn into_result(self) -> Result<(), ValidationError>;
}

impl IntoResult for ValidationError {
  fn into_result(self) -> Result<(), ValidationError> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

fn check_name(err: &mut ValidationError, name: &str) {
  if name.trim().is_empty() {
    err.push("name", "cannot be blank");
  }
}

/// Handles end up in column names and URLs: lowercase ascii, digits and
/// underscores, starting with a letter.
fn check_handle(err: &mut ValidationError, handle: &str) {
  let mut chars = handle.chars();
  let valid = matches!(chars.next(), Some('a'..='z'))
    && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'));
  if !valid {
    err.push("handle", "must be lowercase letters, digits and underscores");
  }
}

fn storage(e: rusqlite::Error) -> SaveError {
  SaveError::Storage(e.to_string())
}

// ─── Inserts ─────────────────────────────────────────────────────────────────

fn insert_tag_group(
  conn: &rusqlite::Connection,
  group: &TagGroup,
) -> Result<i64, SaveError> {
  let now = encode_dt(Utc::now());
  conn
    .execute(
      "INSERT INTO \"tag_groups\"
         (\"name\", \"handle\", \"date_created\", \"date_updated\", \"uid\")
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![group.name, group.handle, now, now, new_uid()],
    )
    .map_err(|e| {
      conflict("tag_group", &[("tag_groups.handle", "handle")], e)
    })?;
  Ok(conn.last_insert_rowid())
}

fn insert_field_group(
  conn: &rusqlite::Connection,
  group: &FieldGroup,
) -> Result<i64, SaveError> {
  let now = encode_dt(Utc::now());
  conn
    .execute(
      "INSERT INTO \"field_groups\"
         (\"name\", \"date_created\", \"date_updated\", \"uid\")
       VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![group.name, now, now, new_uid()],
    )
    .map_err(|e| conflict("field_group", &[("field_groups.name", "name")], e))?;
  Ok(conn.last_insert_rowid())
}

/// Saving a field also adds its `field_<handle>` column to the content
/// table, so entry content has somewhere to go. Both happen in one
/// transaction.
fn insert_field(
  conn: &mut rusqlite::Connection,
  field: &Field,
) -> Result<i64, SaveError> {
  let tx = conn.transaction().map_err(storage)?;
  let now = encode_dt(Utc::now());

  tx.execute(
    "INSERT INTO \"fields\"
       (\"group_id\", \"name\", \"handle\", \"translatable\", \"field_type\",
        \"settings\", \"date_created\", \"date_updated\", \"uid\")
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      field.group_id,
      field.name,
      field.handle,
      field.translatable,
      field.field_type,
      field.settings.to_string(),
      now,
      now,
      new_uid(),
    ],
  )
  .map_err(|e| conflict("field", &[("fields.handle", "handle")], e))?;
  let id = tx.last_insert_rowid();

  tx.execute_batch(&format!(
    "ALTER TABLE \"content\" ADD COLUMN {} TEXT",
    quote(&format!("field_{}", field.handle))
  ))
  .map_err(storage)?;

  tx.commit().map_err(storage)?;
  Ok(id)
}

/// Inserts the section, its locales, and its default entry type. A single
/// section is born with its one entry (element + entry + content rows).
fn insert_section(
  conn: &mut rusqlite::Connection,
  section: &Section,
) -> Result<SavedSection, SaveError> {
  let tx = conn.transaction().map_err(storage)?;
  let now = encode_dt(Utc::now());

  tx.execute(
    "INSERT INTO \"sections\"
       (\"name\", \"handle\", \"kind\", \"has_urls\", \"template\",
        \"date_created\", \"date_updated\", \"uid\")
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      section.name,
      section.handle,
      section.kind.as_str(),
      section.has_urls,
      section.template,
      now,
      now,
      new_uid(),
    ],
  )
  .map_err(|e| {
    conflict(
      "section",
      &[("sections.handle", "handle"), ("sections.name", "name")],
      e,
    )
  })?;
  let section_id = tx.last_insert_rowid();

  for locale in &section.locales {
    tx.execute(
      "INSERT INTO \"section_locales\"
         (\"section_id\", \"locale\", \"url_format\", \"date_created\",
          \"date_updated\", \"uid\")
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        section_id,
        locale.locale,
        locale.url_format,
        now,
        now,
        new_uid(),
      ],
    )
    .map_err(|e| conflict("section", &[], e))?;
  }

  tx.execute(
    "INSERT INTO \"entry_types\"
       (\"section_id\", \"name\", \"has_title_field\", \"title_label\",
        \"date_created\", \"date_updated\", \"uid\")
     VALUES (?1, ?2, 1, 'Title', ?3, ?4, ?5)",
    rusqlite::params![section_id, section.name, now, now, new_uid()],
  )
  .map_err(storage)?;
  let entry_type_id = tx.last_insert_rowid();

  let entry_id = match section.kind {
    SectionKind::Single => {
      let element_id = insert_element(&tx, "entry", true)?;
      tx.execute(
        "INSERT INTO \"entries\"
           (\"id\", \"section_id\", \"type_id\", \"post_date\",
            \"date_created\", \"date_updated\", \"uid\")
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
          element_id,
          section_id,
          entry_type_id,
          now,
          now,
          now,
          new_uid(),
        ],
      )
      .map_err(storage)?;

      let locale = &section.locales[0].locale;
      tx.execute(
        "INSERT INTO \"content\"
           (\"element_id\", \"locale\", \"date_created\", \"date_updated\",
            \"uid\")
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![element_id, locale, now, now, new_uid()],
      )
      .map_err(|e| conflict("section", &[], e))?;

      Some(element_id)
    }
    SectionKind::Channel => None,
  };

  tx.commit().map_err(storage)?;
  Ok(SavedSection { id: section_id, entry_type_id, entry_id })
}

fn update_entry_type(
  conn: &rusqlite::Connection,
  entry_type: &EntryType,
) -> Result<(), SaveError> {
  let layout = serde_json::to_string(&entry_type.field_layout)
    .map_err(|e| SaveError::Storage(e.to_string()))?;
  let updated = conn
    .execute(
      "UPDATE \"entry_types\"
       SET \"name\" = ?1, \"has_title_field\" = ?2, \"title_label\" = ?3,
           \"field_layout\" = ?4, \"date_updated\" = ?5
       WHERE \"id\" = ?6",
      rusqlite::params![
        entry_type.name,
        entry_type.has_title_field,
        entry_type.title_label,
        layout,
        encode_dt(Utc::now()),
        entry_type.id,
      ],
    )
    .map_err(storage)?;

  if updated == 0 {
    return Err(SaveError::Storage(format!(
      "unknown entry type {}",
      entry_type.id
    )));
  }
  Ok(())
}

/// With `entry.id` set, updates the content of an existing entry (the
/// auto-created single-section one). Otherwise creates the element, entry,
/// and content rows. Field values whose content column does not exist are
/// skipped with a warning — an incomplete layout is accepted, not repaired.
fn upsert_entry(
  conn: &mut rusqlite::Connection,
  entry: &NewEntry,
) -> Result<i64, SaveError> {
  let tx = conn.transaction().map_err(storage)?;
  let now = encode_dt(Utc::now());

  let element_id = match entry.id {
    Some(element_id) => {
      let updated = tx
        .execute(
          "UPDATE \"content\"
           SET \"title\" = ?1, \"date_updated\" = ?2
           WHERE \"element_id\" = ?3 AND \"locale\" = ?4",
          rusqlite::params![entry.title, now, element_id, entry.locale],
        )
        .map_err(storage)?;
      if updated == 0 {
        return Err(SaveError::Storage(format!(
          "no content row for element {element_id} in locale {}",
          entry.locale
        )));
      }
      element_id
    }
    None => {
      let element_id = insert_element(&tx, "entry", entry.enabled)?;
      tx.execute(
        "INSERT INTO \"entries\"
           (\"id\", \"section_id\", \"type_id\", \"author_id\", \"post_date\",
            \"date_created\", \"date_updated\", \"uid\")
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
          element_id,
          entry.section_id,
          entry.type_id,
          entry.author_id,
          now,
          now,
          now,
          new_uid(),
        ],
      )
      .map_err(|e| conflict("entry", &[], e))?;

      tx.execute(
        "INSERT INTO \"content\"
           (\"element_id\", \"locale\", \"title\", \"date_created\",
            \"date_updated\", \"uid\")
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![element_id, entry.locale, entry.title, now, now, new_uid()],
      )
      .map_err(|e| conflict("entry", &[], e))?;

      element_id
    }
  };

  let columns = content_columns(&tx)?;
  for (handle, value) in &entry.content {
    let column = format!("field_{handle}");
    if !columns.iter().any(|c| *c == column) {
      tracing::warn!(
        field = %handle,
        "content column missing; skipping field value"
      );
      continue;
    }
    tx.execute(
      &format!(
        "UPDATE \"content\" SET {} = ?1
         WHERE \"element_id\" = ?2 AND \"locale\" = ?3",
        quote(&column)
      ),
      rusqlite::params![value, element_id, entry.locale],
    )
    .map_err(storage)?;
  }

  tx.commit().map_err(storage)?;
  Ok(element_id)
}

fn insert_settings(
  conn: &rusqlite::Connection,
  category: &str,
  settings: &str,
) -> Result<(), SaveError> {
  let now = encode_dt(Utc::now());
  conn
    .execute(
      "INSERT INTO \"system_settings\"
         (\"category\", \"settings\", \"date_created\", \"date_updated\",
          \"uid\")
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![category, settings, now, now, new_uid()],
    )
    .map(|_| ())
    .map_err(|e| {
      conflict("settings", &[("system_settings.category", "category")], e)
    })
}

// ─── Shared row helpers ──────────────────────────────────────────────────────

fn insert_element(
  conn: &rusqlite::Connection,
  kind: &str,
  enabled: bool,
) -> Result<i64, SaveError> {
  let now = encode_dt(Utc::now());
  conn
    .execute(
      "INSERT INTO \"elements\"
         (\"kind\", \"enabled\", \"archived\", \"date_created\",
          \"date_updated\", \"uid\")
       VALUES (?1, ?2, 0, ?3, ?4, ?5)",
      rusqlite::params![kind, enabled, now, now, new_uid()],
    )
    .map_err(storage)?;
  Ok(conn.last_insert_rowid())
}

fn content_columns(
  conn: &rusqlite::Connection,
) -> Result<Vec<String>, SaveError> {
  let mut stmt = conn
    .prepare("SELECT \"name\" FROM pragma_table_info('content')")
    .map_err(storage)?;
  let names = stmt
    .query_map([], |row| row.get::<_, String>(0))
    .map_err(storage)?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(storage)?;
  Ok(names)
}
