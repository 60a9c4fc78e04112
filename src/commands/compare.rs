// ABOUTME: Compare command: report drift between production and local MySQL
// ABOUTME: Prints a per-table summary; never mutates either side

use anyhow::{Context, Result};
use mysql_async::Conn;

use crate::mysql::catalog;
use crate::state;
use crate::sync::{self, TableComparison};
use crate::{mysql, Error};

pub async fn command(
    local: Option<String>,
    production: Option<String>,
    database: Option<String>,
    table: Option<String>,
) -> Result<()> {
    let saved = state::load().context("Failed to load state")?;
    let local_url = super::resolve_url(local, saved.local_url, "local")?;
    let production_url = super::resolve_url(production, saved.production_url, "production")?;

    let mut production_conn = mysql::connect(&mysql::parse_mysql_url(&production_url)?)
        .await
        .context("Failed to connect to production")?;
    let mut local_conn = mysql::connect(&mysql::parse_mysql_url(&local_url)?)
        .await
        .context("Failed to connect to local")?;

    let result = run(&mut production_conn, &mut local_conn, database, table).await;

    // Close both connections regardless of how the comparison went.
    let (production_close, local_close) =
        tokio::join!(production_conn.disconnect(), local_conn.disconnect());
    result?;
    production_close?;
    local_close?;
    Ok(())
}

async fn run(
    production_conn: &mut Conn,
    local_conn: &mut Conn,
    database: Option<String>,
    table: Option<String>,
) -> Result<()> {
    mysql::ping(production_conn)
        .await
        .context("Production connection check failed")?;
    mysql::ping(local_conn)
        .await
        .context("Local connection check failed")?;

    let Some(database) = database else {
        let databases = catalog::list_databases(production_conn).await?;
        println!("Databases on production:");
        for db in &databases {
            println!("  {db}");
        }
        println!("\nPass --database <name> to compare one.");
        return Ok(());
    };

    let comparisons = match table {
        Some(table) => {
            match sync::compare_table(production_conn, local_conn, &database, &table).await {
                Ok(comparison) => vec![comparison],
                Err(Error::TableMissing(table)) => {
                    println!("Table `{table}` does not exist on production.");
                    vec![]
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => sync::compare_database(production_conn, local_conn, &database).await?,
    };

    for comparison in &comparisons {
        print_comparison(comparison);
    }

    let drifted = comparisons
        .iter()
        .filter(|c| c.diff.as_ref().is_some_and(|d| !d.in_sync()))
        .count();
    println!(
        "\n{} table(s) compared, {} with drift.",
        comparisons.len(),
        drifted
    );

    Ok(())
}

fn print_comparison(comparison: &TableComparison) {
    println!("\nTable `{}`:", comparison.table);
    println!(
        "  production rows: {}, local rows: {}",
        comparison.production_rows, comparison.local_rows
    );

    if comparison.local_missing {
        println!("  table is missing locally; all production rows need sync");
    }

    if let Some(columns) = &comparison.columns {
        if !columns.all_match() {
            if !columns.missing_in_target.is_empty() {
                println!("  columns missing locally: {}", columns.missing_in_target.join(", "));
            }
            if !columns.missing_in_source.is_empty() {
                println!(
                    "  columns only present locally: {}",
                    columns.missing_in_source.join(", ")
                );
            }
        }
    }

    if let Some(diff) = &comparison.diff {
        if diff.in_sync() && diff.only_in_target.is_empty() {
            println!("  in sync");
        } else {
            println!(
                "  only in production: {}, only local: {}, modified: {}, identical: {}",
                diff.only_in_source.len(),
                diff.only_in_target.len(),
                diff.modified.len(),
                diff.identical.len()
            );
        }
    }

    if let Some(error) = &comparison.error {
        println!("  error: {error}");
    }
}
