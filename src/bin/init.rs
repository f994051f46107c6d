//! pokebattle_init - One-time analytics database initialization tool
//!
//! Creates a fresh SQLite database for battle notes.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pokebattle database initialization tool
#[derive(Parser, Debug)]
#[command(
    name = "pokebattle_init",
    version,
    about = "Initialize a new pokebattle notes database"
)]
struct Args {
    /// Path to SQLite database file to create (must not exist)
    #[arg(short, long)]
    database: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokebattle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    pokebattle::init::init_database(&args.database).await?;

    Ok(())
}
