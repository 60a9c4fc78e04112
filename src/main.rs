// ABOUTME: CLI entry point for dbreconcile
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Parser, Subcommand};
use dbreconcile::commands;

#[derive(Parser)]
#[command(name = "dbreconcile")]
#[command(about = "MySQL drift detection, selective sync, and MySQL-to-PostgreSQL migration", long_about = None)]
#[command(version)]
struct Cli {
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare local tables against production and report drift
    Compare {
        /// Local MySQL URL (falls back to saved endpoint)
        #[arg(long)]
        local: Option<String>,
        /// Production MySQL URL (falls back to saved endpoint)
        #[arg(long)]
        production: Option<String>,
        /// Database to compare (omit to list production databases)
        #[arg(long)]
        database: Option<String>,
        /// Compare only this table (default: every production table)
        #[arg(long)]
        table: Option<String>,
    },
    /// Apply production rows to a local table (production authoritative)
    Sync {
        #[arg(long)]
        local: Option<String>,
        #[arg(long)]
        production: Option<String>,
        #[arg(long)]
        database: String,
        #[arg(long)]
        table: String,
        /// Also delete rows that exist only locally (separately confirmed)
        #[arg(long)]
        delete_local_only: bool,
        /// Recovery when sync fails partway (default: prompt)
        #[arg(long, value_enum)]
        on_error: Option<commands::sync::OnError>,
        /// Skip confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Add columns to a local table that production has and it lacks
    Repair {
        #[arg(long)]
        local: Option<String>,
        #[arg(long)]
        production: Option<String>,
        #[arg(long)]
        database: String,
        #[arg(long)]
        table: String,
    },
    /// Migrate MySQL tables into PostgreSQL (drop, recreate, copy)
    Migrate {
        /// Source MySQL URL (falls back to saved production endpoint)
        #[arg(long)]
        source: Option<String>,
        /// Target PostgreSQL URL (falls back to saved endpoint)
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        database: String,
        /// Migrate only this table (default: every source table)
        #[arg(long)]
        table: Option<String>,
    },
    /// Manage saved endpoint URLs
    Endpoints {
        #[command(flatten)]
        args: commands::endpoints::EndpointsArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // We need to parse CLI args early to get the log level
    let cli = Cli::parse();

    // Initialize logging
    // 1. RUST_LOG environment variable has highest precedence
    // 2. --log flag is used if RUST_LOG is not set
    // 3. Default to "info" if neither are provided
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Compare {
            local,
            production,
            database,
            table,
        } => commands::compare::command(local, production, database, table).await,
        Commands::Sync {
            local,
            production,
            database,
            table,
            delete_local_only,
            on_error,
            yes,
        } => {
            commands::sync::command(
                local,
                production,
                database,
                table,
                delete_local_only,
                on_error,
                yes,
            )
            .await
        }
        Commands::Repair {
            local,
            production,
            database,
            table,
        } => commands::repair::command(local, production, database, table).await,
        Commands::Migrate {
            source,
            target,
            database,
            table,
        } => commands::migrate::command(source, target, database, table).await,
        Commands::Endpoints { args } => commands::endpoints::command(args).await,
    }
}
