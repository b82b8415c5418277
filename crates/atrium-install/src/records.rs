//! Table definitions for the platform's entity records.
//!
//! One function per record, registered in [`Registry::platform`]
//! (crate::catalog::Registry::platform). Users, entries, and tags share
//! their primary key with an `elements` row; deleting the element cascades
//! into the specialised row.

use atrium_core::schema::{
  Column, ColumnType, DefaultValue, FkAction, ForeignKey, Index,
  SchemaDefinition,
};

pub fn elements() -> SchemaDefinition {
  SchemaDefinition::new("elements")
    .column(
      Column::new("kind", ColumnType::Varchar).max_length(150).not_null(),
    )
    .column(
      Column::new("enabled", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(true)),
    )
    .column(
      Column::new("archived", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .index(Index::on(&["kind"]))
}

pub fn locales() -> SchemaDefinition {
  SchemaDefinition::new("locales")
    .primary_key(&["locale"])
    .column(Column::new("locale", ColumnType::Locale).not_null())
    .column(Column::new("sort_order", ColumnType::SmallInt).not_null())
}

pub fn users() -> SchemaDefinition {
  SchemaDefinition::new("users")
    .column(
      Column::new("username", ColumnType::Varchar).max_length(100).not_null(),
    )
    .column(
      Column::new("password", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("email", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("admin", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(Column::new("last_login_date", ColumnType::DateTime))
    .index(Index::unique(&["username"]))
    .index(Index::unique(&["email"]))
    .foreign_key(
      ForeignKey::new("id", "elements", "id").on_delete(FkAction::Cascade),
    )
}

pub fn sessions() -> SchemaDefinition {
  SchemaDefinition::new("sessions")
    .column(Column::new("user_id", ColumnType::Int).not_null())
    .column(
      Column::new("token", ColumnType::Varchar).max_length(100).not_null(),
    )
    .index(Index::on(&["token"]))
    .index(Index::on(&["user_id"]))
    .foreign_key(
      ForeignKey::new("user_id", "users", "id").on_delete(FkAction::Cascade),
    )
}

pub fn field_groups() -> SchemaDefinition {
  SchemaDefinition::new("field_groups")
    .column(
      Column::new("name", ColumnType::Varchar).max_length(255).not_null(),
    )
    .index(Index::unique(&["name"]))
}

pub fn fields() -> SchemaDefinition {
  SchemaDefinition::new("fields")
    .column(Column::new("group_id", ColumnType::Int).not_null())
    .column(
      Column::new("name", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("handle", ColumnType::Varchar).max_length(64).not_null(),
    )
    .column(Column::new("instructions", ColumnType::Text))
    .column(
      Column::new("translatable", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(
      Column::new("field_type", ColumnType::Varchar)
        .max_length(150)
        .not_null(),
    )
    .column(Column::new("settings", ColumnType::Text))
    .index(Index::unique(&["handle"]))
    .foreign_key(
      ForeignKey::new("group_id", "field_groups", "id")
        .on_delete(FkAction::Cascade),
    )
}

pub fn sections() -> SchemaDefinition {
  SchemaDefinition::new("sections")
    .column(
      Column::new("name", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("handle", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("kind", ColumnType::Varchar).max_length(20).not_null(),
    )
    .column(
      Column::new("has_urls", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(true)),
    )
    .column(Column::new("template", ColumnType::Varchar).max_length(500))
    .index(Index::unique(&["handle"]))
    .index(Index::unique(&["name"]))
}

pub fn section_locales() -> SchemaDefinition {
  SchemaDefinition::new("section_locales")
    .column(Column::new("section_id", ColumnType::Int).not_null())
    .column(Column::new("locale", ColumnType::Locale).not_null())
    .column(Column::new("url_format", ColumnType::Varchar).max_length(255))
    .index(Index::unique(&["section_id", "locale"]))
    .foreign_key(
      ForeignKey::new("section_id", "sections", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("locale", "locales", "locale")
        .on_delete(FkAction::Cascade)
        .on_update(FkAction::Cascade),
    )
}

pub fn entry_types() -> SchemaDefinition {
  SchemaDefinition::new("entry_types")
    .column(Column::new("section_id", ColumnType::Int).not_null())
    .column(
      Column::new("name", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("has_title_field", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(true)),
    )
    .column(
      Column::new("title_label", ColumnType::Varchar)
        .max_length(255)
        .not_null()
        .default_value(DefaultValue::Text("Title".to_string())),
    )
    .column(Column::new("field_layout", ColumnType::Text))
    .index(Index::on(&["section_id"]))
    .foreign_key(
      ForeignKey::new("section_id", "sections", "id")
        .on_delete(FkAction::Cascade),
    )
}

pub fn entries() -> SchemaDefinition {
  SchemaDefinition::new("entries")
    .column(Column::new("section_id", ColumnType::Int).not_null())
    .column(Column::new("type_id", ColumnType::Int).not_null())
    .column(Column::new("author_id", ColumnType::Int))
    .column(Column::new("post_date", ColumnType::DateTime).not_null())
    .column(Column::new("expiry_date", ColumnType::DateTime))
    .index(Index::on(&["section_id"]))
    .index(Index::on(&["author_id"]))
    .index(Index::on(&["post_date"]))
    .foreign_key(
      ForeignKey::new("id", "elements", "id").on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("section_id", "sections", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("type_id", "entry_types", "id")
        .on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("author_id", "users", "id")
        .on_delete(FkAction::SetNull),
    )
}

pub fn tag_groups() -> SchemaDefinition {
  SchemaDefinition::new("tag_groups")
    .column(
      Column::new("name", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(
      Column::new("handle", ColumnType::Varchar).max_length(255).not_null(),
    )
    .index(Index::unique(&["handle"]))
}

pub fn tags() -> SchemaDefinition {
  SchemaDefinition::new("tags")
    .column(Column::new("group_id", ColumnType::Int).not_null())
    .column(
      Column::new("name", ColumnType::Varchar).max_length(255).not_null(),
    )
    .index(Index::unique(&["group_id", "name"]))
    .foreign_key(
      ForeignKey::new("id", "elements", "id").on_delete(FkAction::Cascade),
    )
    .foreign_key(
      ForeignKey::new("group_id", "tag_groups", "id")
        .on_delete(FkAction::Cascade),
    )
}

pub fn system_settings() -> SchemaDefinition {
  SchemaDefinition::new("system_settings")
    .column(
      Column::new("category", ColumnType::Varchar).max_length(15).not_null(),
    )
    .column(Column::new("settings", ColumnType::Text))
    .index(Index::unique(&["category"]))
}

pub fn migrations() -> SchemaDefinition {
  SchemaDefinition::new("migrations")
    .column(
      Column::new("version", ColumnType::Varchar).max_length(255).not_null(),
    )
    .column(Column::new("apply_time", ColumnType::DateTime).not_null())
    .index(Index::unique(&["version"]))
}
