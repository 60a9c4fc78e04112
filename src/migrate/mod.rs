// ABOUTME: Cross-engine migrator: recreate a MySQL table on PostgreSQL and copy its rows
// ABOUTME: Introspect, drop, create, then per-row tolerant copy with attempted/inserted counts

pub mod typemap;

use mysql_async::Conn;
use serde::Serialize;
use tokio_postgres::Client;
use tracing::{info, warn};

use crate::mysql::catalog::{self, ColumnDescriptor};
use crate::mysql::reader;
use crate::postgres::{self, quote_ident};
use crate::value::{Record, Value};

/// One source column and the PostgreSQL type it was mapped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedColumn {
    pub name: String,
    pub source_type: String,
    pub postgres_type: String,
}

/// Result of migrating one table.
///
/// Partial data copies are still a success: `rows_attempted` and
/// `rows_inserted` diverge instead. `error` is set only when the migration
/// stopped before or during structure creation. `mapped_columns` records the
/// type mapping applied to each source column; empty when introspection never
/// completed.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    pub table: String,
    pub create_statement: Option<String>,
    pub mapped_columns: Vec<MappedColumn>,
    pub rows_attempted: usize,
    pub rows_inserted: usize,
    pub error: Option<String>,
}

impl MigrationOutcome {
    fn failed(table: &str, error: String) -> Self {
        Self {
            table: table.to_string(),
            create_statement: None,
            mapped_columns: Vec::new(),
            rows_attempted: 0,
            rows_inserted: 0,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Record how each source column's type maps to PostgreSQL.
fn map_columns(columns: &[ColumnDescriptor]) -> Vec<MappedColumn> {
    columns
        .iter()
        .map(|col| MappedColumn {
            name: col.name.clone(),
            source_type: col.column_type.clone(),
            postgres_type: typemap::mysql_to_postgres(&col.column_type).to_string(),
        })
        .collect()
}

/// Migrate one table: read its MySQL structure, drop and recreate it on
/// PostgreSQL, then copy every row, skipping rows that fail to insert.
pub async fn migrate_table(
    source: &mut Conn,
    target: &Client,
    database: &str,
    table: &str,
) -> MigrationOutcome {
    let columns = match catalog::get_columns(source, database, table).await {
        Ok(columns) => columns,
        Err(e) => return MigrationOutcome::failed(table, format!("no columns found: {e}")),
    };
    let primary_key = match catalog::get_primary_key(source, database, table).await {
        Ok(pk) => pk,
        Err(e) => return MigrationOutcome::failed(table, e.to_string()),
    };

    let mapped_columns = map_columns(&columns);
    let create_statement = build_create_statement(table, &columns, primary_key.as_deref());

    // Absence of the target table is not an error.
    let drop_statement = format!("DROP TABLE IF EXISTS {}", quote_ident(table));
    if let Err(e) = postgres::execute(target, &drop_statement).await {
        return MigrationOutcome::failed(table, format!("dropping target table failed: {e}"));
    }
    if let Err(e) = postgres::execute(target, &create_statement).await {
        return MigrationOutcome::failed(table, format!("creating target table failed: {e}"));
    }

    let rows = match reader::fetch_rows(source, database, table).await {
        Ok(rows) => rows,
        Err(e) => {
            return MigrationOutcome {
                table: table.to_string(),
                create_statement: Some(create_statement),
                mapped_columns,
                rows_attempted: 0,
                rows_inserted: 0,
                error: Some(format!("reading source rows failed: {e}")),
            }
        }
    };

    let column_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let mut inserted = 0;
    for (index, record) in rows.iter().enumerate() {
        let insert = build_insert_statement(table, &column_names, record);
        match postgres::execute(target, &insert).await {
            Ok(_) => inserted += 1,
            Err(e) => {
                warn!(table, row = index + 1, error = %e, "row insert failed, skipping");
            }
        }
    }

    info!(
        table,
        attempted = rows.len(),
        inserted,
        "migration complete"
    );
    MigrationOutcome {
        table: table.to_string(),
        create_statement: Some(create_statement),
        mapped_columns,
        rows_attempted: rows.len(),
        rows_inserted: inserted,
        error: None,
    }
}

/// Build the PostgreSQL CREATE TABLE statement for a set of MySQL columns.
///
/// A column that is both the sole primary key and auto-incrementing becomes
/// SERIAL or BIGSERIAL depending on the mapped integer width. Plain-value
/// source defaults carry over; expression defaults and CURRENT_TIMESTAMP are
/// dropped because their syntax is not portable.
pub fn build_create_statement(
    table: &str,
    columns: &[ColumnDescriptor],
    primary_key: Option<&str>,
) -> String {
    let definitions: Vec<String> = columns
        .iter()
        .map(|col| {
            let quoted = quote_ident(&col.name);
            let pg_type = typemap::mysql_to_postgres(&col.column_type);
            let is_pk = primary_key == Some(col.name.as_str());

            if is_pk && col.is_auto_increment() {
                let serial = if pg_type == "BIGINT" { "BIGSERIAL" } else { "SERIAL" };
                return format!("{quoted} {serial} PRIMARY KEY");
            }

            let mut def = format!("{quoted} {pg_type}");
            if is_pk {
                def.push_str(" PRIMARY KEY");
            }
            if !col.is_nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = plain_default(col) {
                def.push_str(" DEFAULT ");
                def.push_str(&default);
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        definitions.join(", ")
    )
}

/// A source default rendered as a PostgreSQL literal, or `None` when the
/// default is an expression and cannot be carried across dialects.
fn plain_default(col: &ColumnDescriptor) -> Option<String> {
    let default = col.default.as_deref()?;
    let upper = default.to_uppercase();
    if upper.starts_with("CURRENT_TIMESTAMP") || default.contains('(') {
        return None;
    }
    if upper == "NULL" {
        return None;
    }
    if default.parse::<f64>().is_ok() {
        Some(default.to_string())
    } else {
        Some(crate::value::quote_literal(default))
    }
}

/// Build a single-row INSERT with all values encoded as literals.
fn build_insert_statement(table: &str, column_names: &[String], record: &Record) -> String {
    let columns: Vec<String> = column_names.iter().map(|c| quote_ident(c)).collect();
    let values: Vec<String> = column_names
        .iter()
        .map(|name| {
            record
                .get(name)
                .unwrap_or(&Value::Null)
                .to_pg_literal()
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        values.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(
        name: &str,
        column_type: &str,
        nullable: bool,
        default: Option<&str>,
        extra: &str,
    ) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: column_type
                .split('(')
                .next()
                .unwrap_or(column_type)
                .to_string(),
            column_type: column_type.to_string(),
            is_nullable: nullable,
            default: default.map(str::to_string),
            extra: extra.to_string(),
        }
    }

    #[test]
    fn test_create_statement_bigserial_for_wide_auto_increment_pk() {
        let columns = vec![
            column("id", "bigint(20) unsigned", false, None, "auto_increment"),
            column("name", "varchar(100)", false, None, ""),
        ];
        let statement = build_create_statement("users", &columns, Some("id"));
        assert_eq!(
            statement,
            "CREATE TABLE \"users\" (\"id\" BIGSERIAL PRIMARY KEY, \"name\" VARCHAR NOT NULL)"
        );
    }

    #[test]
    fn test_create_statement_serial_for_narrow_auto_increment_pk() {
        let columns = vec![column("id", "int(11)", false, None, "auto_increment")];
        let statement = build_create_statement("t", &columns, Some("id"));
        assert_eq!(statement, "CREATE TABLE \"t\" (\"id\" SERIAL PRIMARY KEY)");
    }

    #[test]
    fn test_create_statement_non_auto_pk_and_defaults() {
        let columns = vec![
            column("code", "char(2)", false, None, ""),
            column("qty", "int(11)", false, Some("0"), ""),
            column("status", "varchar(20)", true, Some("pending"), ""),
        ];
        let statement = build_create_statement("items", &columns, Some("code"));
        assert_eq!(
            statement,
            "CREATE TABLE \"items\" (\"code\" CHAR PRIMARY KEY NOT NULL, \
             \"qty\" INTEGER NOT NULL DEFAULT 0, \
             \"status\" VARCHAR DEFAULT 'pending')"
        );
    }

    #[test]
    fn test_create_statement_drops_expression_defaults() {
        let columns = vec![
            column(
                "created_at",
                "timestamp",
                false,
                Some("CURRENT_TIMESTAMP"),
                "",
            ),
            column("uid", "varchar(36)", false, Some("uuid()"), ""),
        ];
        let statement = build_create_statement("t", &columns, None);
        assert!(!statement.contains("DEFAULT"));
    }

    #[test]
    fn test_insert_statement_literal_encoding() {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::Int(1));
        record.insert("name".to_string(), Value::Text("o'hare".to_string()));
        record.insert("data".to_string(), Value::Bytes(vec![0xab]));
        record.insert("active".to_string(), Value::Bool(true));

        let names: Vec<String> = ["id", "name", "data", "active"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let statement = build_insert_statement("t", &names, &record);
        assert_eq!(
            statement,
            "INSERT INTO \"t\" (\"id\", \"name\", \"data\", \"active\") \
             VALUES (1, 'o''hare', '\\xab', true)"
        );
    }

    #[test]
    fn test_map_columns_records_each_type_mapping() {
        let columns = vec![
            column("id", "bigint(20) unsigned", false, None, "auto_increment"),
            column("payload", "json", true, None, ""),
        ];
        let mapped = map_columns(&columns);
        assert_eq!(
            mapped,
            vec![
                MappedColumn {
                    name: "id".to_string(),
                    source_type: "bigint(20) unsigned".to_string(),
                    postgres_type: "BIGINT".to_string(),
                },
                MappedColumn {
                    name: "payload".to_string(),
                    source_type: "json".to_string(),
                    postgres_type: "JSONB".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_insert_statement_missing_column_is_null() {
        let record = Record::new();
        let names = vec!["id".to_string()];
        let statement = build_insert_statement("t", &names, &record);
        assert_eq!(statement, "INSERT INTO \"t\" (\"id\") VALUES (NULL)");
    }
}
