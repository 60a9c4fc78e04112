// ABOUTME: Endpoints command: manage saved connection URLs
// ABOUTME: Stores local/production MySQL and target PostgreSQL URLs in the state file

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use crate::state;

#[derive(Args)]
pub struct EndpointsArgs {
    #[command(subcommand)]
    command: EndpointsCommands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Endpoint {
    /// Local MySQL server (sync target)
    Local,
    /// Production MySQL server (authoritative source)
    Production,
    /// PostgreSQL migration target
    Postgres,
}

#[derive(Subcommand)]
enum EndpointsCommands {
    /// Save a URL for an endpoint
    Set { endpoint: Endpoint, url: String },
    /// Remove a saved URL
    Unset { endpoint: Endpoint },
    /// Show the saved URLs
    Get,
}

fn slot<'a>(state: &'a mut state::AppState, endpoint: Endpoint) -> &'a mut Option<String> {
    match endpoint {
        Endpoint::Local => &mut state.local_url,
        Endpoint::Production => &mut state.production_url,
        Endpoint::Postgres => &mut state.postgres_url,
    }
}

pub async fn command(args: EndpointsArgs) -> Result<()> {
    match args.command {
        EndpointsCommands::Set { endpoint, url } => {
            let mut state = state::load().context("Failed to load state")?;
            *slot(&mut state, endpoint) = Some(url.clone());
            state::save(&state).context("Failed to save state")?;
            println!("{endpoint:?} URL set to: {url}");
        }
        EndpointsCommands::Unset { endpoint } => {
            let mut state = state::load().context("Failed to load state")?;
            *slot(&mut state, endpoint) = None;
            state::save(&state).context("Failed to save state")?;
            println!("{endpoint:?} URL unset.");
        }
        EndpointsCommands::Get => {
            let state = state::load().context("Failed to load state")?;
            print_slot("local", &state.local_url);
            print_slot("production", &state.production_url);
            print_slot("postgres", &state.postgres_url);
        }
    }
    Ok(())
}

fn print_slot(name: &str, url: &Option<String>) {
    match url {
        Some(url) => println!("{name}: {url}"),
        None => println!("{name}: not set"),
    }
}
