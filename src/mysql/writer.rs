// ABOUTME: Mutation primitives for MySQL targets
// ABOUTME: Statement builders are separated from execution so they can be unit tested

use mysql_async::prelude::Queryable;
use mysql_async::Conn;

use super::{quote_ident, quote_table};
use crate::error::{Error, Result};
use crate::value::{Record, Value};

/// Upsert one record by primary key.
///
/// Column order comes from the record itself; values are always bound as
/// parameters, never spliced into the statement.
pub async fn upsert_record(
    conn: &mut Conn,
    database: &str,
    table: &str,
    record: &Record,
) -> Result<()> {
    let columns: Vec<String> = record.keys().cloned().collect();
    let statement = build_upsert_statement(database, table, &columns);
    let params: Vec<mysql_async::Value> = record.values().map(mysql_async::Value::from).collect();

    conn.exec_drop(statement, params)
        .await
        .map_err(|e| Error::classify_mysql(table, e))
}

/// Delete one record by primary key value.
pub async fn delete_record(
    conn: &mut Conn,
    database: &str,
    table: &str,
    primary_key: &str,
    key_value: &Value,
) -> Result<()> {
    let statement = build_delete_statement(database, table, primary_key);
    let params = vec![mysql_async::Value::from(key_value)];

    conn.exec_drop(statement, params)
        .await
        .map_err(|e| Error::classify_mysql(table, e))
}

/// Add a column using a source-side definition fragment.
pub async fn add_column(
    conn: &mut Conn,
    database: &str,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<()> {
    let statement = build_add_column_statement(database, table, column, definition);
    conn.query_drop(statement)
        .await
        .map_err(|e| Error::classify_mysql(table, e))
}

/// Rename a table within the same database.
pub async fn rename_table(conn: &mut Conn, database: &str, from: &str, to: &str) -> Result<()> {
    let statement = build_rename_statement(database, from, to);
    conn.query_drop(statement)
        .await
        .map_err(|e| Error::classify_mysql(from, e))
}

/// Set the connection's default schema.
///
/// `SHOW CREATE TABLE` emits DDL with an unqualified table name, so the
/// connection must be scoped before replaying it; the connection URL may not
/// carry a database at all.
pub async fn use_database(conn: &mut Conn, database: &str) -> Result<()> {
    conn.query_drop(build_use_statement(database))
        .await
        .map_err(Error::from)
}

/// Run an arbitrary DDL statement (used for idempotent CREATE TABLE exports).
pub async fn execute_ddl(conn: &mut Conn, table: &str, ddl: &str) -> Result<()> {
    conn.query_drop(ddl)
        .await
        .map_err(|e| Error::classify_mysql(table, e))
}

fn build_upsert_statement(database: &str, table: &str, columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    let updates: Vec<String> = quoted.iter().map(|c| format!("{c} = VALUES({c})")).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
        quote_table(database, table),
        quoted.join(", "),
        placeholders.join(", "),
        updates.join(", ")
    )
}

fn build_delete_statement(database: &str, table: &str, primary_key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_table(database, table),
        quote_ident(primary_key)
    )
}

fn build_add_column_statement(database: &str, table: &str, column: &str, definition: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_table(database, table),
        quote_ident(column),
        definition
    )
}

fn build_rename_statement(database: &str, from: &str, to: &str) -> String {
    format!(
        "RENAME TABLE {} TO {}",
        quote_table(database, from),
        quote_table(database, to)
    )
}

fn build_use_statement(database: &str) -> String {
    format!("USE {}", quote_ident(database))
}
