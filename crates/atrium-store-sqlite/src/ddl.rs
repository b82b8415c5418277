//! SQLite DDL generation from schema definitions.
//!
//! SQLite cannot add a constraint to an existing table, but it does accept
//! REFERENCES clauses naming tables that do not exist yet, so foreign keys
//! are inlined at CREATE TABLE time and creation order carries no dependency
//! constraint. Length caps on string columns are enforced by record
//! validation, not by the storage layer.

use atrium_core::schema::{
  Column, ColumnType, DefaultValue, FkAction, ForeignKey, Index, IndexKind,
  SchemaDefinition,
};

/// The CREATE TABLE statement for one definition: columns, primary key,
/// defaults, unsigned checks, and inline foreign keys.
pub(crate) fn create_table_sql(def: &SchemaDefinition) -> String {
  let mut lines: Vec<String> = Vec::new();

  if def.with_id {
    let mut line = format!("{} INTEGER PRIMARY KEY", quote("id"));
    if let Some(fk) = foreign_key_for(def, "id") {
      line.push(' ');
      line.push_str(&references_sql(fk));
    }
    lines.push(line);
  }

  for column in &def.columns {
    lines.push(column_sql(def, column));
  }

  if def.with_audit {
    lines.push(format!("{} TEXT NOT NULL", quote("date_created")));
    lines.push(format!("{} TEXT NOT NULL", quote("date_updated")));
    lines.push(format!("{} TEXT NOT NULL", quote("uid")));
  }

  if !def.primary_key.is_empty() {
    let columns: Vec<String> =
      def.primary_key.iter().map(|c| quote(c)).collect();
    lines.push(format!("PRIMARY KEY ({})", columns.join(", ")));
  }

  format!(
    "CREATE TABLE {} (\n  {}\n)",
    quote(&def.table),
    lines.join(",\n  ")
  )
}

/// One statement per index. B-tree indexes become CREATE (UNIQUE) INDEX; the
/// full-text kind becomes an external-content fts5 virtual table, because
/// the generic index builder cannot express full-text semantics.
pub(crate) fn index_statements(def: &SchemaDefinition) -> Vec<String> {
  def
    .indexes
    .iter()
    .map(|index| match index.kind {
      IndexKind::BTree => btree_index_sql(&def.table, index),
      IndexKind::FullText => fulltext_index_sql(&def.table, index),
    })
    .collect()
}

fn column_sql(def: &SchemaDefinition, column: &Column) -> String {
  let mut line = format!("{} {}", quote(&column.name), sql_type(column.ty));
  if !column.nullable {
    line.push_str(" NOT NULL");
  }
  if let Some(default) = &column.default {
    line.push_str(" DEFAULT ");
    line.push_str(&default_sql(default));
  }
  if column.unsigned {
    line.push_str(&format!(" CHECK ({} >= 0)", quote(&column.name)));
  }
  if let Some(fk) = foreign_key_for(def, &column.name) {
    line.push(' ');
    line.push_str(&references_sql(fk));
  }
  line
}

fn sql_type(ty: ColumnType) -> &'static str {
  match ty {
    ColumnType::Int | ColumnType::SmallInt | ColumnType::Bool => "INTEGER",
    ColumnType::Varchar
    | ColumnType::Text
    | ColumnType::MediumText
    | ColumnType::DateTime
    | ColumnType::Locale => "TEXT",
  }
}

fn default_sql(default: &DefaultValue) -> String {
  match default {
    DefaultValue::Int(value) => value.to_string(),
    DefaultValue::Bool(true) => "1".to_string(),
    DefaultValue::Bool(false) => "0".to_string(),
    DefaultValue::Text(value) => format!("'{}'", value.replace('\'', "''")),
  }
}

fn foreign_key_for<'a>(
  def: &'a SchemaDefinition,
  column: &str,
) -> Option<&'a ForeignKey> {
  def.foreign_keys.iter().find(|fk| fk.column == column)
}

fn references_sql(fk: &ForeignKey) -> String {
  let mut sql = format!(
    "REFERENCES {} ({})",
    quote(&fk.target_table),
    quote(&fk.target_column)
  );
  if let Some(action) = action_sql(fk.on_delete) {
    sql.push_str(" ON DELETE ");
    sql.push_str(action);
  }
  if let Some(action) = action_sql(fk.on_update) {
    sql.push_str(" ON UPDATE ");
    sql.push_str(action);
  }
  sql
}

fn action_sql(action: FkAction) -> Option<&'static str> {
  match action {
    FkAction::NoAction => None,
    FkAction::Cascade => Some("CASCADE"),
    FkAction::SetNull => Some("SET NULL"),
  }
}

fn btree_index_sql(table: &str, index: &Index) -> String {
  let columns: Vec<String> = index.columns.iter().map(|c| quote(c)).collect();
  format!(
    "CREATE {}INDEX {} ON {} ({})",
    if index.unique { "UNIQUE " } else { "" },
    quote(&index_name(table, index)),
    quote(table),
    columns.join(", ")
  )
}

fn fulltext_index_sql(table: &str, index: &Index) -> String {
  let columns: Vec<String> = index.columns.iter().map(|c| quote(c)).collect();
  format!(
    "CREATE VIRTUAL TABLE {} USING fts5({}, content={})",
    quote(&format!("{table}_fts")),
    columns.join(", "),
    quote(table)
  )
}

fn index_name(table: &str, index: &Index) -> String {
  format!("idx_{table}_{}", index.columns.join("_"))
}

pub(crate) fn quote(identifier: &str) -> String {
  format!("\"{identifier}\"")
}
