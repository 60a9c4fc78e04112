// ABOUTME: Sync command: apply production rows to the local table, with caller-gated deletes
// ABOUTME: Gathers all confirmations here and hands the core explicit policy values

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use dialoguer::{Confirm, Select};
use mysql_async::Conn;

use crate::mysql::{catalog, writer};
use crate::state;
use crate::sync::{self, ReconcileOptions, RecoveryAction};
use crate::{mysql, Error};

/// What to do when a table's sync loop fails partway through.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnError {
    Skip,
    Replace,
}

impl From<OnError> for RecoveryAction {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Skip => RecoveryAction::Skip,
            OnError::Replace => RecoveryAction::Replace,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn command(
    local: Option<String>,
    production: Option<String>,
    database: String,
    table: String,
    delete_local_only: bool,
    on_error: Option<OnError>,
    yes: bool,
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

    let result = run(
        &mut production_conn,
        &mut local_conn,
        &database,
        &table,
        delete_local_only,
        on_error,
        yes,
    )
    .await;

    // Close both connections regardless of how the sync went.
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
    delete_local_only: bool,
    on_error: Option<OnError>,
    yes: bool,
) -> Result<()> {
    let comparison = sync::compare_table(production_conn, local_conn, database, table).await?;

    let Some(primary_key) = comparison.primary_key.clone() else {
        return Err(Error::NoPrimaryKey(table.to_string()).into());
    };
    if let Some(error) = &comparison.error {
        bail!("Cannot sync `{table}`: {error}");
    }
    let Some(diff) = comparison.diff.clone() else {
        bail!("Cannot sync `{table}`: no diff available");
    };

    if comparison.local_missing {
        if !yes
            && !Confirm::new()
                .with_prompt(format!(
                    "Table `{table}` does not exist locally. Create it from production?"
                ))
                .default(true)
                .interact()?
        {
            println!("Aborted.");
            return Ok(());
        }
        let ddl = catalog::create_statement(production_conn, database, table).await?;
        // The exported DDL names the table unqualified.
        writer::use_database(local_conn, database).await?;
        writer::execute_ddl(local_conn, table, &ddl).await?;
        println!("Created `{table}` locally.");
    }

    if diff.in_sync() && (diff.only_in_target.is_empty() || !delete_local_only) {
        println!("Table `{table}` is already in sync.");
        return Ok(());
    }

    println!(
        "Sync plan for `{table}`: {} upsert(s){}",
        diff.records_to_sync().len(),
        if delete_local_only {
            format!(", {} delete(s)", diff.only_in_target.len())
        } else {
            String::new()
        }
    );

    if !yes
        && !Confirm::new()
            .with_prompt("Apply these changes to the local table?")
            .default(false)
            .interact()?
    {
        println!("Aborted.");
        return Ok(());
    }

    // Deleting local-only rows is a separate decision from upserting.
    let delete_confirmed = delete_local_only
        && !diff.only_in_target.is_empty()
        && (yes
            || Confirm::new()
                .with_prompt(format!(
                    "Delete {} row(s) that exist only locally? This cannot be undone.",
                    diff.only_in_target.len()
                ))
                .default(false)
                .interact()?);

    let options = ReconcileOptions {
        delete_local_only: delete_confirmed,
    };
    let outcome =
        sync::reconcile(local_conn, database, table, &diff, &primary_key, options).await;

    println!(
        "Upserted {} record(s), deleted {} record(s).",
        outcome.upserted, outcome.deleted
    );

    if let Some(error) = &outcome.error {
        println!("Sync failed partway: {error}");
        let recovery = choose_recovery(on_error, yes)?;
        match recovery {
            RecoveryAction::Skip => {
                println!("Skipped `{table}`; the table is left partially synced.");
            }
            RecoveryAction::Replace => {
                let replace =
                    sync::replace_table(production_conn, local_conn, database, table).await;
                match replace.error {
                    None => println!(
                        "Replaced `{table}` from production; previous data kept as `{}`.",
                        replace.backup_table
                    ),
                    Some(error) => println!("Replace failed: {error}"),
                }
            }
        }
    }

    Ok(())
}

fn choose_recovery(on_error: Option<OnError>, yes: bool) -> Result<RecoveryAction> {
    if let Some(choice) = on_error {
        return Ok(choice.into());
    }
    if yes {
        // Non-interactive runs default to the non-destructive path.
        return Ok(RecoveryAction::Skip);
    }
    let selection = Select::new()
        .with_prompt("Recovery for this table")
        .items(&[
            "skip (leave partially synced)",
            "replace (back up local table and rebuild from production)",
        ])
        .default(0)
        .interact()?;
    Ok(match selection {
        1 => RecoveryAction::Replace,
        _ => RecoveryAction::Skip,
    })
}
