// ABOUTME: Migrate command: one-time copy of MySQL tables into PostgreSQL
// ABOUTME: Drops and recreates each target table, then copies rows tolerantly

use anyhow::{Context, Result};
use mysql_async::Conn;
use tokio_postgres::Client;

use crate::migrate::migrate_table;
use crate::mysql::catalog;
use crate::state;
use crate::{mysql, postgres};

pub async fn command(
    source: Option<String>,
    target: Option<String>,
    database: String,
    table: Option<String>,
) -> Result<()> {
    let saved = state::load().context("Failed to load state")?;
    let source_url = super::resolve_url(source, saved.production_url, "source")?;
    let target_url = super::resolve_url(target, saved.postgres_url, "target")?;

    let mut source_conn = mysql::connect(&mysql::parse_mysql_url(&source_url)?)
        .await
        .context("Failed to connect to MySQL source")?;
    let target_client = postgres::connect(&target_url)
        .await
        .context("Failed to connect to PostgreSQL target")?;

    // Close the MySQL side regardless of how the migration went; the
    // PostgreSQL client closes when its task observes the drop.
    let result = run(&mut source_conn, &target_client, &database, table).await;
    let close = source_conn.disconnect().await;
    result?;
    close?;
    Ok(())
}

async fn run(
    source_conn: &mut Conn,
    target_client: &Client,
    database: &str,
    table: Option<String>,
) -> Result<()> {
    let tables = match table {
        Some(table) => vec![table],
        None => catalog::list_tables(source_conn, database).await?,
    };

    let mut migrated = 0;
    let mut failed = 0;
    let mut rows_skipped = 0;

    for table in &tables {
        let outcome = migrate_table(source_conn, target_client, database, table).await;
        match &outcome.error {
            None => {
                migrated += 1;
                rows_skipped += outcome.rows_attempted - outcome.rows_inserted;
                println!(
                    "Migrated `{table}` ({} column(s) mapped): {} of {} row(s) inserted.",
                    outcome.mapped_columns.len(),
                    outcome.rows_inserted,
                    outcome.rows_attempted
                );
            }
            Some(error) => {
                failed += 1;
                println!("Migration of `{table}` failed: {error}");
            }
        }
    }

    println!(
        "\n{migrated} table(s) migrated, {failed} failed, {rows_skipped} row(s) skipped."
    );

    Ok(())
}
