//! Unit tests for the DDL dialect and the transaction coordinator, plus
//! gateway checks against in-memory databases.

use atrium_core::{
  error::SchemaError,
  gateway::SchemaGateway,
  schema::{
    Column, ColumnType, DefaultValue, FkAction, ForeignKey, Index,
    SchemaDefinition,
  },
};

use crate::{SqliteStore, ddl, run_in_transaction};

// ─── DDL generation ──────────────────────────────────────────────────────────

fn users_def() -> SchemaDefinition {
  SchemaDefinition::new("users")
    .column(
      Column::new("username", ColumnType::Varchar).max_length(100).not_null(),
    )
    .column(
      Column::new("admin", ColumnType::Bool)
        .not_null()
        .default_value(DefaultValue::Bool(false)),
    )
    .column(Column::new("build", ColumnType::Int).unsigned().not_null())
    .index(Index::unique(&["username"]))
    .foreign_key(
      ForeignKey::new("id", "elements", "id").on_delete(FkAction::Cascade),
    )
}

#[test]
fn create_table_renders_id_with_inline_foreign_key() {
  let sql = ddl::create_table_sql(&users_def());
  assert!(sql.starts_with("CREATE TABLE \"users\""), "{sql}");
  assert!(
    sql.contains(
      "\"id\" INTEGER PRIMARY KEY REFERENCES \"elements\" (\"id\") \
       ON DELETE CASCADE"
    ),
    "{sql}"
  );
}

#[test]
fn create_table_renders_not_null_default_and_unsigned_check() {
  let sql = ddl::create_table_sql(&users_def());
  assert!(sql.contains("\"username\" TEXT NOT NULL"), "{sql}");
  assert!(sql.contains("\"admin\" INTEGER NOT NULL DEFAULT 0"), "{sql}");
  assert!(
    sql.contains("\"build\" INTEGER NOT NULL CHECK (\"build\" >= 0)"),
    "{sql}"
  );
}

#[test]
fn create_table_appends_audit_columns_by_default() {
  let sql = ddl::create_table_sql(&users_def());
  assert!(sql.contains("\"date_created\" TEXT NOT NULL"), "{sql}");
  assert!(sql.contains("\"date_updated\" TEXT NOT NULL"), "{sql}");
  assert!(sql.contains("\"uid\" TEXT NOT NULL"), "{sql}");

  let bare = ddl::create_table_sql(
    &SchemaDefinition::new("plain")
      .without_id()
      .without_audit()
      .column(Column::new("value", ColumnType::Text)),
  );
  assert!(!bare.contains("date_created"), "{bare}");
  assert!(!bare.contains("\"id\""), "{bare}");
}

#[test]
fn composite_primary_key_replaces_the_surrogate_id() {
  let def = SchemaDefinition::new("searchindex")
    .primary_key(&["element_id", "locale"])
    .column(Column::new("element_id", ColumnType::Int).not_null())
    .column(Column::new("locale", ColumnType::Locale).not_null());

  let sql = ddl::create_table_sql(&def);
  assert!(!sql.contains("\"id\" INTEGER PRIMARY KEY"), "{sql}");
  assert!(sql.contains("PRIMARY KEY (\"element_id\", \"locale\")"), "{sql}");
}

#[test]
fn index_statements_render_unique_and_plain_indexes() {
  let statements = ddl::index_statements(&users_def());
  assert_eq!(statements, [
    "CREATE UNIQUE INDEX \"idx_users_username\" ON \"users\" (\"username\")",
  ]);
}

#[test]
fn fulltext_index_becomes_an_fts5_virtual_table() {
  let def = SchemaDefinition::new("searchindex")
    .without_audit()
    .primary_key(&["element_id"])
    .column(Column::new("element_id", ColumnType::Int).not_null())
    .column(Column::new("keywords", ColumnType::Text).not_null())
    .index(Index::fulltext("keywords"));

  let statements = ddl::index_statements(&def);
  assert_eq!(statements, [
    "CREATE VIRTUAL TABLE \"searchindex_fts\" USING \
     fts5(\"keywords\", content=\"searchindex\")",
  ]);
}

#[test]
fn text_defaults_are_quoted() {
  let def = SchemaDefinition::new("entry_types").column(
    Column::new("title_label", ColumnType::Varchar)
      .not_null()
      .default_value(DefaultValue::Text("Title".to_string())),
  );
  let sql = ddl::create_table_sql(&def);
  assert!(sql.contains("\"title_label\" TEXT NOT NULL DEFAULT 'Title'"), "{sql}");
}

// ─── Transaction coordinator ─────────────────────────────────────────────────

fn scratch_conn() -> rusqlite::Connection {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn
    .execute_batch("CREATE TABLE scratch (value TEXT NOT NULL)")
    .unwrap();
  conn
}

fn count(conn: &rusqlite::Connection) -> i64 {
  conn
    .query_row("SELECT COUNT(*) FROM scratch", [], |row| row.get(0))
    .unwrap()
}

#[test]
fn commits_on_success() {
  let mut conn = scratch_conn();
  run_in_transaction::<_, SchemaError>(&mut conn, |tx| {
    tx.execute("INSERT INTO scratch (value) VALUES ('a')", [])
      .map_err(|e| SchemaError::Storage(e.to_string()))?;
    Ok(())
  })
  .unwrap();

  assert!(conn.is_autocommit());
  assert_eq!(count(&conn), 1);
}

#[test]
fn rolls_back_on_error() {
  let mut conn = scratch_conn();
  let result = run_in_transaction::<(), SchemaError>(&mut conn, |tx| {
    tx.execute("INSERT INTO scratch (value) VALUES ('a')", [])
      .map_err(|e| SchemaError::Storage(e.to_string()))?;
    Err(SchemaError::Storage("boom".to_string()))
  });

  assert!(result.is_err());
  assert!(conn.is_autocommit());
  assert_eq!(count(&conn), 0);
}

#[test]
fn reentrant_call_defers_commit_to_the_outer_transaction() {
  let mut conn = scratch_conn();
  conn.execute_batch("BEGIN").unwrap();

  run_in_transaction::<_, SchemaError>(&mut conn, |tx| {
    tx.execute("INSERT INTO scratch (value) VALUES ('a')", [])
      .map_err(|e| SchemaError::Storage(e.to_string()))?;
    Ok(())
  })
  .unwrap();

  // Still inside the outer transaction; the coordinator committed nothing.
  assert!(!conn.is_autocommit());
  conn.execute_batch("ROLLBACK").unwrap();
  assert_eq!(count(&conn), 0);
}

#[test]
fn reentrant_failure_leaves_the_outer_transaction_open() {
  let mut conn = scratch_conn();
  conn.execute_batch("BEGIN").unwrap();
  conn
    .execute("INSERT INTO scratch (value) VALUES ('outer')", [])
    .unwrap();

  let result = run_in_transaction::<(), SchemaError>(&mut conn, |_| {
    Err(SchemaError::Storage("boom".to_string()))
  });

  assert!(result.is_err());
  assert!(!conn.is_autocommit());
  // The outer owner decides; its work is still intact.
  assert_eq!(count(&conn), 1);
  conn.execute_batch("COMMIT").unwrap();
  assert_eq!(count(&conn), 1);
}

// ─── Gateway checks ──────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_reports_not_installed() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  assert!(!store.is_installed().await.unwrap());
}
