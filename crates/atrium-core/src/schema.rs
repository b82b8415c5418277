//! Transient DDL descriptions — tables, columns, indexes, foreign keys.
//!
//! These types describe the physical shape of one table. They are built
//! fresh on every installation run, consumed once by the storage gateway,
//! and never persisted. Semantic column types are mapped to concrete SQL
//! types by the storage dialect, not here.

use std::collections::HashSet;

use crate::error::SchemaError;

// ─── Columns ─────────────────────────────────────────────────────────────────

/// Semantic column type. The storage dialect picks the physical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Int,
  SmallInt,
  Bool,
  /// Variable-length string. Length caps are enforced by record validation,
  /// not by every storage backend.
  Varchar,
  Text,
  MediumText,
  DateTime,
  /// A locale code used as a join key; must match the `locales` table's key
  /// column type exactly.
  Locale,
}

/// A literal default value rendered into the DDL.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
  Int(i64),
  Bool(bool),
  Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
  pub name:       String,
  pub ty:         ColumnType,
  pub max_length: Option<u16>,
  pub nullable:   bool,
  pub unsigned:   bool,
  pub default:    Option<DefaultValue>,
}

impl Column {
  pub fn new(name: &str, ty: ColumnType) -> Self {
    Self {
      name: name.to_string(),
      ty,
      max_length: None,
      nullable: true,
      unsigned: false,
      default: None,
    }
  }

  pub fn not_null(mut self) -> Self {
    self.nullable = false;
    self
  }

  pub fn max_length(mut self, n: u16) -> Self {
    self.max_length = Some(n);
    self
  }

  pub fn unsigned(mut self) -> Self {
    self.unsigned = true;
    self
  }

  pub fn default_value(mut self, value: DefaultValue) -> Self {
    self.default = Some(value);
    self
  }
}

// ─── Indexes ─────────────────────────────────────────────────────────────────

/// The kind of index. Full-text is only expressible for the search table and
/// is emitted by the dialect as its own DDL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
  #[default]
  BTree,
  FullText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
  pub columns: Vec<String>,
  pub unique:  bool,
  pub kind:    IndexKind,
}

impl Index {
  pub fn on(columns: &[&str]) -> Self {
    Self {
      columns: columns.iter().map(|c| c.to_string()).collect(),
      unique:  false,
      kind:    IndexKind::BTree,
    }
  }

  pub fn unique(columns: &[&str]) -> Self {
    Self { unique: true, ..Self::on(columns) }
  }

  pub fn fulltext(column: &str) -> Self {
    Self { kind: IndexKind::FullText, ..Self::on(&[column]) }
  }
}

// ─── Foreign keys ────────────────────────────────────────────────────────────

/// Referential action on delete/update of the target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FkAction {
  #[default]
  NoAction,
  Cascade,
  SetNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
  pub column:        String,
  pub target_table:  String,
  pub target_column: String,
  pub on_delete:     FkAction,
  pub on_update:     FkAction,
}

impl ForeignKey {
  pub fn new(column: &str, target_table: &str, target_column: &str) -> Self {
    Self {
      column:        column.to_string(),
      target_table:  target_table.to_string(),
      target_column: target_column.to_string(),
      on_delete:     FkAction::NoAction,
      on_update:     FkAction::NoAction,
    }
  }

  pub fn on_delete(mut self, action: FkAction) -> Self {
    self.on_delete = action;
    self
  }

  pub fn on_update(mut self, action: FkAction) -> Self {
    self.on_update = action;
    self
  }
}

// ─── Table definitions ───────────────────────────────────────────────────────

/// The full physical description of one table.
///
/// By default a table gets a surrogate `id` primary key and the audit columns
/// (`date_created`, `date_updated`, `uid`); definitions opt out explicitly.
/// A definition with `primary_key` set has no surrogate id.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
  pub table:        String,
  pub columns:      Vec<Column>,
  pub indexes:      Vec<Index>,
  pub foreign_keys: Vec<ForeignKey>,
  pub with_id:      bool,
  pub with_audit:   bool,
  pub primary_key:  Vec<String>,
}

impl SchemaDefinition {
  pub fn new(table: &str) -> Self {
    Self {
      table:        table.to_string(),
      columns:      Vec::new(),
      indexes:      Vec::new(),
      foreign_keys: Vec::new(),
      with_id:      true,
      with_audit:   true,
      primary_key:  Vec::new(),
    }
  }

  pub fn column(mut self, column: Column) -> Self {
    self.columns.push(column);
    self
  }

  pub fn index(mut self, index: Index) -> Self {
    self.indexes.push(index);
    self
  }

  pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
    self.foreign_keys.push(fk);
    self
  }

  pub fn without_id(mut self) -> Self {
    self.with_id = false;
    self
  }

  pub fn without_audit(mut self) -> Self {
    self.with_audit = false;
    self
  }

  /// Replace the surrogate id with an explicit (possibly composite) key.
  pub fn primary_key(mut self, columns: &[&str]) -> Self {
    self.primary_key = columns.iter().map(|c| c.to_string()).collect();
    self.with_id = false;
    self
  }

  fn has_column(&self, name: &str) -> bool {
    (self.with_id && name == "id") || self.columns.iter().any(|c| c.name == name)
  }
}

// ─── Schema plan ─────────────────────────────────────────────────────────────

/// The validated, ordered set of tables for one installation run.
///
/// Construction checks the catalog invariants up front: table names are
/// unique across the plan, every foreign key names a column of its own table,
/// and every foreign-key target table is itself created within the same run.
/// Creation order therefore carries no dependency constraint.
#[derive(Debug, Clone)]
pub struct SchemaPlan {
  tables: Vec<SchemaDefinition>,
}

impl SchemaPlan {
  pub fn new(tables: Vec<SchemaDefinition>) -> Result<Self, SchemaError> {
    let mut names = HashSet::new();
    for def in &tables {
      if !names.insert(def.table.as_str()) {
        return Err(SchemaError::DuplicateTable(def.table.clone()));
      }
    }

    for def in &tables {
      for fk in &def.foreign_keys {
        if !def.has_column(&fk.column) {
          return Err(SchemaError::UnknownForeignKeyColumn {
            table:  def.table.clone(),
            column: fk.column.clone(),
          });
        }
        if !names.contains(fk.target_table.as_str()) {
          return Err(SchemaError::UnknownForeignKeyTarget {
            table:  def.table.clone(),
            column: fk.column.clone(),
            target: fk.target_table.clone(),
          });
        }
      }
    }

    Ok(Self { tables })
  }

  pub fn tables(&self) -> &[SchemaDefinition] { &self.tables }

  pub fn len(&self) -> usize { self.tables.len() }

  pub fn is_empty(&self) -> bool { self.tables.is_empty() }
}
