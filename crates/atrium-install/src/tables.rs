//! The fixed system tables — infrastructure the platform needs regardless of
//! which entity records exist.
//!
//! These are not discovered through the catalog; the installer appends them
//! to the plan after the record tables.

use atrium_core::schema::{
  Column, ColumnType, DefaultValue, FkAction, ForeignKey, Index,
  SchemaDefinition,
};

/// Every fixed table, in creation order.
pub fn system_tables() -> Vec<SchemaDefinition> {
  vec![
    content(),
    relations(),
    shunned_messages(),
    search_index(),
    template_caches(),
    template_cache_elements(),
    template_cache_criteria(),
    info(),
    asset_transform_index(),
    storage_credentials(),
    deprecation_errors(),
  ]
}

/// Localised element content. Field columns (`field_<handle>`) are added to
/// this table as fields are saved.
pub fn content() -> SchemaDefinition {
  SchemaDefinition::new("content")
    .column(Column::new("element_id", ColumnType::Int).not_null())
    .column(Column::new("locale", ColumnType::Locale).not_null())
    .column(Column::new("title", ColumnType::Varchar).max_length(255))
    .index(Index::unique(&["element_id", "locale"]))
    .index(Index::on(&["title"]))
    .foreign_key(
      ForeignKey::new("element_id", "elements", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("locale", "locales", "locale")
        .on_delete(FkAction::Cascade)
        .on_update(FkAction::Cascade),
    )
}

pub fn relations() -> SchemaDefinition {
  SchemaDefinition::new("relations")
    .column(Column::new("field_id", ColumnType::Int).not_null())
    .column(Column::new("source_id", ColumnType::Int).not_null())
    .column(Column::new("source_locale", ColumnType::Locale))
    .column(Column::new("target_id", ColumnType::Int).not_null())
    .column(Column::new("sort_order", ColumnType::SmallInt))
    .index(Index::unique(&[
      "field_id",
      "source_id",
      "source_locale",
      "target_id",
    ]))
    .foreign_key(
      ForeignKey::new("field_id", "fields", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("source_id", "elements", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("source_locale", "locales", "locale")
        .on_delete(FkAction::Cascade)
        .on_update(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("target_id", "elements", "id")
        .on_delete(FkAction::Cascade),
    )
}

pub fn shunned_messages() -> SchemaDefinition {
  SchemaDefinition::new("shunnedmessages")
    .column(Column::new("user_id", ColumnType::Int).not_null())
    .column(
      Column::new("message", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(Column::new("expiry_date", ColumnType::DateTime))
    .index(Index::unique(&["user_id", "message"]))
    .foreign_key(
      ForeignKey::new("user_id", "users", "id").on_delete(FkAction::Cascade),
    )
}

/// The search index. Composite primary key; the full-text index over
/// `keywords` is emitted by the dialect as a separate statement because the
/// generic column/index builder cannot express full-text semantics.
pub fn search_index() -> SchemaDefinition {
  SchemaDefinition::new("searchindex")
    .primary_key(&["element_id", "attribute", "field_id", "locale"])
    .without_audit()
    .column(Column::new("element_id", ColumnType::Int).not_null())
    .column(
      Column::new("attribute", ColumnType::Varchar).max_length(25).not_null(),
    )
    .column(Column::new("field_id", ColumnType::Int).not_null())
    .column(Column::new("locale", ColumnType::Locale).not_null())
    .column(Column::new("keywords", ColumnType::Text).not_null())
    .index(Index::fulltext("keywords"))
}

/// Cached template output. Elements and criteria rows cascade-delete with
/// their owning cache row but not with the referenced content element, so
/// deleting an element never invalidates unrelated caches.
pub fn template_caches() -> SchemaDefinition {
  SchemaDefinition::new("templatecaches")
    .without_audit()
    .column(
      Column::new("cache_key", ColumnType::Varchar)
        .max_length(255)
        .not_null(),
    )
    .column(Column::new("locale", ColumnType::Locale).not_null())
    .column(Column::new("path", ColumnType::Varchar).max_length(255))
    .column(Column::new("expiry_date", ColumnType::DateTime).not_null())
    .column(Column::new("body", ColumnType::MediumText).not_null())
    .index(Index::on(&["expiry_date", "cache_key", "locale", "path"]))
    .foreign_key(
      ForeignKey::new("locale", "locales", "locale")
        .on_delete(FkAction::Cascade)
        .on_update(FkAction::Cascade),
    )
}

pub fn template_cache_elements() -> SchemaDefinition {
  SchemaDefinition::new("templatecacheelements")
    .without_id()
    .without_audit()
    .column(Column::new("cache_id", ColumnType::Int).not_null())
    .column(Column::new("element_id", ColumnType::Int).not_null())
    .foreign_key(
      ForeignKey::new("cache_id", "templatecaches", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("element_id", "elements", "id")
        .on_delete(FkAction::Cascade),
    )
}

pub fn template_cache_criteria() -> SchemaDefinition {
  SchemaDefinition::new("templatecachecriteria")
    .without_audit()
    .column(Column::new("cache_id", ColumnType::Int).not_null())
    .column(
      Column::new("kind", ColumnType::Varchar).max_length(150).not_null(),
    )
    .column(Column::new("criteria", ColumnType::Text).not_null())
    .index(Index::on(&["kind"]))
    .foreign_key(
      ForeignKey::new("cache_id", "templatecaches", "id")
        .on_delete(FkAction::Cascade),
    )
}

/// System metadata. Exactly one row, written inside the install transaction.
pub fn info() -> SchemaDefinition {
  SchemaDefinition::new("info")
    .column(
      Column::new("version", ColumnType::Varchar).max_length(15).not_null(),
    )
    .column(Column::new("build", ColumnType::Int).unsigned().not_null())
    .column(
      Column::new("schema_version", ColumnType::Varchar)
        .max_length(15)
        .not_null(),
    )
    .column(Column::new("release_date", ColumnType::DateTime).not_null())
    .column(
      Column::new("site_name", ColumnType::Varchar)
        .max_length(100)
        .not_null(),
    )
    .column(
      Column::new("site_url", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(Column::new("timezone", ColumnType::Varchar).max_length(30))
    .column(
      Column::new("on", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(
      Column::new("maintenance", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(
      Column::new("track", ColumnType::Varchar).max_length(40).not_null(),
    )
}

/// Generation state for derived asset files.
pub fn asset_transform_index() -> SchemaDefinition {
  SchemaDefinition::new("assettransformindex")
    .column(Column::new("file_id", ColumnType::Int).not_null())
    .column(Column::new("filename", ColumnType::Varchar).max_length(255))
    .column(Column::new("format", ColumnType::Varchar).max_length(255))
    .column(
      Column::new("location", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(Column::new("source_id", ColumnType::Int))
    .column(
      Column::new("file_exists", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(
      Column::new("in_progress", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(Column::new("date_indexed", ColumnType::DateTime))
    .index(Index::on(&["source_id", "file_id", "location"]))
}

/// Access credentials for the external storage provider integration.
pub fn storage_credentials() -> SchemaDefinition {
  SchemaDefinition::new("storagecredentials")
    .column(
      Column::new("connection_key", ColumnType::Varchar)
        .max_length(255)
        .not_null(),
    )
    .column(
      Column::new("token", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("storage_url", ColumnType::Varchar)
        .max_length(255)
        .not_null(),
    )
    .index(Index::unique(&["connection_key"]))
}

/// Deprecated-API usage log, written by the runtime after install.
pub fn deprecation_errors() -> SchemaDefinition {
  SchemaDefinition::new("deprecationerrors")
    .column(
      Column::new("key", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("fingerprint", ColumnType::Varchar)
        .max_length(255)
        .not_null(),
    )
    .column(Column::new("last_occurrence", ColumnType::DateTime).not_null())
    .column(
      Column::new("file", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("line", ColumnType::SmallInt).unsigned().not_null(),
    )
    .column(Column::new("message", ColumnType::Varchar).max_length(255))
    .column(Column::new("traces", ColumnType::Text))
    .index(Index::unique(&["key", "fingerprint"]))
}
