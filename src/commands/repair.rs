// ABOUTME: Repair command: add columns to the local table that production has and it lacks
// ABOUTME: Best effort per column; reports each column's outcome

use anyhow::{Context, Result};
use mysql_async::Conn;

use crate::diff::check_columns;
use crate::mysql::catalog;
use crate::state;
use crate::{mysql, sync};

pub async fn command(
    local: Option<String>,
    production: Option<String>,
    database: String,
    table: String,
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

    let result = run(&mut production_conn, &mut local_conn, &database, &table).await;

    // Close both connections regardless of how the repair went.
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
    database: &str,
    table: &str,
) -> Result<()> {
    let production_columns = catalog::get_columns(production_conn, database, table).await?;
    let local_columns = catalog::get_columns(local_conn, database, table).await?;

    let production_names: Vec<String> =
        production_columns.iter().map(|c| c.name.clone()).collect();
    let local_names: Vec<String> = local_columns.iter().map(|c| c.name.clone()).collect();
    let consistency = check_columns(&production_names, &local_names);

    if consistency.all_match() {
        println!("Columns of `{table}` already match.");
        return Ok(());
    }

    if !consistency.missing_in_source.is_empty() {
        // Local-only columns are left alone; production is authoritative but
        // repair never drops data.
        println!(
            "Columns present only locally (left untouched): {}",
            consistency.missing_in_source.join(", ")
        );
    }

    if consistency.missing_in_target.is_empty() {
        println!("No columns to add locally.");
        return Ok(());
    }

    let repairs = sync::repair_columns(
        production_conn,
        local_conn,
        database,
        table,
        &consistency.missing_in_target,
    )
    .await?;

    for repair in &repairs {
        match &repair.error {
            None => println!("Added column `{}`.", repair.column),
            Some(error) => println!("Failed to add column `{}`: {error}", repair.column),
        }
    }
    let added = repairs.iter().filter(|r| r.added).count();
    println!("{added} of {} column(s) added.", repairs.len());

    Ok(())
}
