// ABOUTME: Reconciliation executor: table compare, upsert/delete application, schema repair, replace
// ABOUTME: Bulk operations capture per-item failures in their outcome instead of returning Err

use chrono::Local;
use mysql_async::Conn;
use serde::Serialize;
use tracing::{info, warn};

use crate::diff::{check_columns, diff_table, ColumnConsistencyResult, DiffResult};
use crate::error::Result;
use crate::mysql::{catalog, reader, writer};
use crate::value::Value;

/// Policy switches for [`reconcile`]. The core never prompts; a presentation
/// layer gathers confirmations and passes the answers in here.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Delete rows that exist only on the sync target. Destructive; off by
    /// default and exposed as a separate decision from the upsert pass.
    pub delete_local_only: bool,
}

/// What to do with a table whose sync loop failed partway through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Leave the table partially synced and move on.
    Skip,
    /// Back up the target table and rebuild it from the authoritative source.
    Replace,
}

/// Result of one table's reconcile pass.
///
/// `error` is set when the loop stopped early; counts always reflect the work
/// actually applied before the stop.
#[derive(Debug, Clone, Serialize)]
pub struct TableReconciliationOutcome {
    pub table: String,
    pub upserted: usize,
    pub deleted: usize,
    pub replaced: bool,
    pub error: Option<String>,
}

impl TableReconciliationOutcome {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            upserted: 0,
            deleted: 0,
            replaced: false,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of replacing a degraded table from the authoritative source.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceOutcome {
    /// Timestamped name the previous target table was renamed to. Empty when
    /// the rename itself never happened.
    pub backup_table: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Per-column result of a schema repair pass.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnRepair {
    pub column: String,
    pub added: bool,
    pub error: Option<String>,
}

/// One table's comparison between the authoritative (production) side and the
/// local side.
#[derive(Debug, Clone, Serialize)]
pub struct TableComparison {
    pub table: String,
    pub primary_key: Option<String>,
    pub production_rows: usize,
    pub local_rows: usize,
    /// True when the table does not exist locally at all; its production rows
    /// are then reported through `diff.only_in_source`.
    pub local_missing: bool,
    pub columns: Option<ColumnConsistencyResult>,
    pub diff: Option<DiffResult>,
    pub error: Option<String>,
}

/// Compare one table across the two servers, production authoritative.
///
/// A table missing locally is not an error: all production rows land in
/// `only_in_source`. A table without a single-column primary key gets an
/// explanatory error and no row diff. Only failures against the production
/// side propagate as `Err`.
pub async fn compare_table(
    production: &mut Conn,
    local: &mut Conn,
    database: &str,
    table: &str,
) -> Result<TableComparison> {
    let prod_snapshot = reader::fetch_snapshot(production, database, table).await?;

    let mut comparison = TableComparison {
        table: table.to_string(),
        primary_key: prod_snapshot.primary_key.clone(),
        production_rows: prod_snapshot.rows.len(),
        local_rows: 0,
        local_missing: false,
        columns: None,
        diff: None,
        error: None,
    };

    let local_snapshot = match reader::fetch_snapshot(local, database, table).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) if e.is_table_missing() => None,
        Err(e) => {
            comparison.error = Some(e.to_string());
            return Ok(comparison);
        }
    };

    let Some(local_snapshot) = local_snapshot else {
        comparison.local_missing = true;
        comparison.diff = Some(DiffResult {
            only_in_source: prod_snapshot.rows.clone(),
            ..DiffResult::default()
        });
        return Ok(comparison);
    };

    comparison.local_rows = local_snapshot.rows.len();
    comparison.columns = Some(check_columns(
        &prod_snapshot.column_names(),
        &local_snapshot.column_names(),
    ));

    let Some(primary_key) = &prod_snapshot.primary_key else {
        comparison.error = Some(format!(
            "table `{table}` has no single-column primary key; row diff skipped"
        ));
        return Ok(comparison);
    };

    comparison.diff = Some(diff_table(
        &prod_snapshot.rows,
        &local_snapshot.rows,
        primary_key,
    ));

    Ok(comparison)
}

/// Compare every production table of `database` against the local server.
///
/// The production table list drives the loop; a failure on one table is
/// recorded in its entry and does not abort the pass.
pub async fn compare_database(
    production: &mut Conn,
    local: &mut Conn,
    database: &str,
) -> Result<Vec<TableComparison>> {
    let tables = catalog::list_tables(production, database).await?;
    let mut comparisons = Vec::with_capacity(tables.len());

    for table in &tables {
        match compare_table(production, local, database, table).await {
            Ok(comparison) => comparisons.push(comparison),
            Err(e) => comparisons.push(TableComparison {
                table: table.clone(),
                primary_key: None,
                production_rows: 0,
                local_rows: 0,
                local_missing: false,
                columns: None,
                diff: None,
                error: Some(e.to_string()),
            }),
        }
    }

    Ok(comparisons)
}

/// Apply a diff to the sync target: upsert the source-side records, then
/// optionally delete target-only rows.
///
/// Stops at the first failed statement and reports it in the outcome; the
/// caller then chooses a [`RecoveryAction`]. Deletes never run when the upsert
/// pass did not complete.
pub async fn reconcile(
    target: &mut Conn,
    database: &str,
    table: &str,
    diff: &DiffResult,
    primary_key: &str,
    options: ReconcileOptions,
) -> TableReconciliationOutcome {
    let mut outcome = TableReconciliationOutcome::new(table);

    for record in diff.records_to_sync() {
        match writer::upsert_record(target, database, table, record).await {
            Ok(()) => outcome.upserted += 1,
            Err(e) => {
                outcome.error = Some(format!(
                    "upsert failed after {} record(s): {e}",
                    outcome.upserted
                ));
                return outcome;
            }
        }
    }

    if options.delete_local_only {
        for record in &diff.only_in_target {
            let key = record.get(primary_key).cloned().unwrap_or(Value::Null);
            match writer::delete_record(target, database, table, primary_key, &key).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    outcome.error = Some(format!(
                        "delete failed after {} record(s): {e}",
                        outcome.deleted
                    ));
                    return outcome;
                }
            }
        }
    }

    info!(
        table,
        upserted = outcome.upserted,
        deleted = outcome.deleted,
        "reconcile complete"
    );
    outcome
}

/// Add the named columns to the target table, copying each column's full
/// definition from the source side.
///
/// Best effort per column: one failure is recorded and the remaining columns
/// are still attempted.
pub async fn repair_columns(
    source: &mut Conn,
    target: &mut Conn,
    database: &str,
    table: &str,
    missing_columns: &[String],
) -> Result<Vec<ColumnRepair>> {
    let source_columns = catalog::get_columns(source, database, table).await?;
    let mut repairs = Vec::with_capacity(missing_columns.len());

    for column in missing_columns {
        let Some(descriptor) = source_columns.iter().find(|c| &c.name == column) else {
            repairs.push(ColumnRepair {
                column: column.clone(),
                added: false,
                error: Some(format!("column `{column}` not found on source side")),
            });
            continue;
        };

        match writer::add_column(target, database, table, column, &descriptor.definition()).await {
            Ok(()) => repairs.push(ColumnRepair {
                column: column.clone(),
                added: true,
                error: None,
            }),
            Err(e) => {
                warn!(table, column = column.as_str(), error = %e, "add column failed");
                repairs.push(ColumnRepair {
                    column: column.clone(),
                    added: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(repairs)
}

/// Replace a degraded target table with a structural and full-data copy of the
/// authoritative source table.
///
/// The previous target table is renamed to `{table}_backup_{timestamp}` first.
/// If any later step fails, the original data survives only under the backup
/// name and the outcome says so explicitly; this function never drops it.
pub async fn replace_table(
    source: &mut Conn,
    target: &mut Conn,
    database: &str,
    table: &str,
) -> ReplaceOutcome {
    let backup_table = format!("{table}_backup_{}", Local::now().format("%Y%m%d%H%M%S"));

    if let Err(e) = writer::rename_table(target, database, table, &backup_table).await {
        return ReplaceOutcome {
            backup_table: String::new(),
            success: false,
            error: Some(format!("backup rename failed, table untouched: {e}")),
        };
    }
    info!(table, backup = backup_table.as_str(), "renamed target table to backup");

    let renamed_away = |step_error: String| ReplaceOutcome {
        backup_table: backup_table.clone(),
        success: false,
        error: Some(format!(
            "{step_error}; the original table now exists only as `{backup_table}` \
             and must be restored manually"
        )),
    };

    let ddl = match catalog::create_statement(source, database, table).await {
        Ok(ddl) => ddl,
        Err(e) => return renamed_away(format!("reading source structure failed: {e}")),
    };
    // The exported DDL names the table unqualified; scope the target
    // connection first or the create lands in the wrong schema (or fails
    // outright when the connection URL carries no database).
    if let Err(e) = writer::use_database(target, database).await {
        return renamed_away(format!("selecting database `{database}` failed: {e}"));
    }
    if let Err(e) = writer::execute_ddl(target, table, &ddl).await {
        return renamed_away(format!("recreating table failed: {e}"));
    }

    let rows = match reader::fetch_rows(source, database, table).await {
        Ok(rows) => rows,
        Err(e) => return renamed_away(format!("reading source rows failed: {e}")),
    };

    let total = rows.len();
    for (index, record) in rows.iter().enumerate() {
        if let Err(e) = writer::upsert_record(target, database, table, record).await {
            return renamed_away(format!("data copy failed at row {} of {total}: {e}", index + 1));
        }
    }

    info!(table, rows = total, "replaced table from authoritative source");
    ReplaceOutcome {
        backup_table,
        success: true,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_options_default_keeps_local_rows() {
        let options = ReconcileOptions::default();
        assert!(!options.delete_local_only);
    }

    #[test]
    fn test_outcome_succeeded() {
        let mut outcome = TableReconciliationOutcome::new("users");
        assert!(outcome.succeeded());
        outcome.error = Some("boom".to_string());
        assert!(!outcome.succeeded());
    }
}
