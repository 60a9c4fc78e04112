// ABOUTME: Catalog introspection against INFORMATION_SCHEMA and SHOW CREATE TABLE
// ABOUTME: Column descriptors, single-column primary key detection, and listings

use mysql_async::prelude::Queryable;
use mysql_async::Conn;

use super::quote_table;
use crate::error::{Error, Result};

/// One column as described by INFORMATION_SCHEMA.COLUMNS.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Bare type name, lowercase (e.g. `varchar`, `bigint`).
    pub data_type: String,
    /// Full type with modifiers (e.g. `varchar(255)`, `bigint unsigned`).
    pub column_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    /// Attributes such as `auto_increment` or `on update CURRENT_TIMESTAMP`.
    pub extra: String,
}

impl ColumnDescriptor {
    /// Assemble the DDL fragment used to re-create this column on another
    /// MySQL server: full type, nullability, default, extra attributes.
    ///
    /// Plain-value defaults are quoted unless they are numeric; expression
    /// defaults (`CURRENT_TIMESTAMP` and parenthesized expressions) pass
    /// through unquoted.
    pub fn definition(&self) -> String {
        let mut def = self.column_type.clone();
        if !self.is_nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            def.push_str(" DEFAULT ");
            if needs_quoting(default) {
                def.push('\'');
                for ch in default.chars() {
                    if ch == '\'' {
                        def.push('\'');
                    }
                    def.push(ch);
                }
                def.push('\'');
            } else {
                def.push_str(default);
            }
        }
        if !self.extra.is_empty() {
            def.push(' ');
            def.push_str(&self.extra);
        }
        def
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_lowercase().contains("auto_increment")
    }
}

fn needs_quoting(default: &str) -> bool {
    if default.parse::<f64>().is_ok() {
        return false;
    }
    let upper = default.to_uppercase();
    if upper.starts_with("CURRENT_TIMESTAMP") || upper == "NULL" {
        return false;
    }
    // Parenthesized expression defaults pass through as written.
    !default.contains('(')
}

/// Fetch column descriptors in ordinal order.
///
/// INFORMATION_SCHEMA returns an empty set rather than an error for unknown
/// tables, so an empty result triggers an existence check and becomes
/// [`Error::TableMissing`].
pub async fn get_columns(
    conn: &mut Conn,
    database: &str,
    table: &str,
) -> Result<Vec<ColumnDescriptor>> {
    let query = "SELECT COLUMN_NAME, DATA_TYPE, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, EXTRA \
                 FROM INFORMATION_SCHEMA.COLUMNS \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
                 ORDER BY ORDINAL_POSITION";

    let rows: Vec<(String, String, String, String, Option<String>, String)> = conn
        .exec(query, (database, table))
        .await
        .map_err(|e| Error::classify_mysql(table, e))?;

    if rows.is_empty() {
        if !table_exists(conn, database, table).await? {
            return Err(Error::TableMissing(table.to_string()));
        }
        return Err(Error::Catalog {
            table: table.to_string(),
            message: "table exists but has no columns".to_string(),
        });
    }

    Ok(rows
        .into_iter()
        .map(
            |(name, data_type, column_type, is_nullable, default, extra)| ColumnDescriptor {
                name,
                data_type: data_type.to_lowercase(),
                column_type: column_type.to_lowercase(),
                is_nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default,
                extra,
            },
        )
        .collect())
}

/// The table's primary key column, if it is a single column.
///
/// Tables with no primary key or a composite one return `None`; row diffing
/// requires exactly one key column.
pub async fn get_primary_key(
    conn: &mut Conn,
    database: &str,
    table: &str,
) -> Result<Option<String>> {
    let query = "SELECT COLUMN_NAME \
                 FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY' \
                 ORDER BY ORDINAL_POSITION";

    let columns: Vec<String> = conn
        .exec(query, (database, table))
        .await
        .map_err(|e| Error::classify_mysql(table, e))?;

    match columns.len() {
        1 => Ok(columns.into_iter().next()),
        _ => Ok(None),
    }
}

pub async fn table_exists(conn: &mut Conn, database: &str, table: &str) -> Result<bool> {
    let query = "SELECT COUNT(*) \
                 FROM INFORMATION_SCHEMA.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

    let count: Option<u64> = conn.exec_first(query, (database, table)).await?;
    Ok(count.unwrap_or(0) > 0)
}

/// List user databases, excluding the MySQL system schemas.
pub async fn list_databases(conn: &mut Conn) -> Result<Vec<String>> {
    let query = "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA \
                 WHERE SCHEMA_NAME NOT IN ('mysql', 'information_schema', 'performance_schema', 'sys') \
                 ORDER BY SCHEMA_NAME";
    Ok(conn.query(query).await?)
}

/// List base tables in a database, alphabetically.
pub async fn list_tables(conn: &mut Conn, database: &str) -> Result<Vec<String>> {
    let query = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
                 ORDER BY TABLE_NAME";
    Ok(conn.exec(query, (database,)).await?)
}

/// `SHOW CREATE TABLE` output rewritten to be idempotent.
pub async fn create_statement(conn: &mut Conn, database: &str, table: &str) -> Result<String> {
    let query = format!("SHOW CREATE TABLE {}", quote_table(database, table));
    let row: Option<(String, String)> = conn
        .query_first(query)
        .await
        .map_err(|e| Error::classify_mysql(table, e))?;

    let (_, ddl) = row.ok_or_else(|| Error::TableMissing(table.to_string()))?;
    Ok(make_idempotent(&ddl))
}

/// Rewrite a `CREATE TABLE` statement to `CREATE TABLE IF NOT EXISTS`.
fn make_idempotent(ddl: &str) -> String {
    if ddl.starts_with("CREATE TABLE IF NOT EXISTS") {
        ddl.to_string()
    } else if let Some(rest) = ddl.strip_prefix("CREATE TABLE") {
        format!("CREATE TABLE IF NOT EXISTS{rest}")
    } else {
        ddl.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(column_type: &str, nullable: bool, default: Option<&str>, extra: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: "c".to_string(),
            data_type: column_type.split('(').next().unwrap_or(column_type).to_string(),
            column_type: column_type.to_string(),
            is_nullable: nullable,
            default: default.map(str::to_string),
            extra: extra.to_string(),
        }
    }

    #[test]
    fn test_definition_not_null_with_numeric_default() {
        let col = descriptor("int", false, Some("0"), "");
        assert_eq!(col.definition(), "int NOT NULL DEFAULT 0");
    }

    #[test]
    fn test_definition_quotes_string_default() {
        let col = descriptor("varchar(50)", true, Some("pending"), "");
        assert_eq!(col.definition(), "varchar(50) DEFAULT 'pending'");
    }

    #[test]
    fn test_definition_current_timestamp_unquoted() {
        let col = descriptor(
            "timestamp",
            false,
            Some("CURRENT_TIMESTAMP"),
            "on update CURRENT_TIMESTAMP",
        );
        assert_eq!(
            col.definition(),
            "timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP on update CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_definition_auto_increment_extra() {
        let col = descriptor("bigint unsigned", false, None, "auto_increment");
        assert_eq!(col.definition(), "bigint unsigned NOT NULL auto_increment");
        assert!(col.is_auto_increment());
    }

    #[test]
    fn test_make_idempotent() {
        assert_eq!(
            make_idempotent("CREATE TABLE `t` (`id` int)"),
            "CREATE TABLE IF NOT EXISTS `t` (`id` int)"
        );
        // Already idempotent DDL passes through unchanged.
        let ddl = "CREATE TABLE IF NOT EXISTS `t` (`id` int)";
        assert_eq!(make_idempotent(ddl), ddl);
    }
}
