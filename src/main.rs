//! pokebattle - battle two pokemon from the command line

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pokebattle::combat::BattleState;
use pokebattle::{Arena, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Turn-based Pokemon battle simulator
#[derive(Parser, Debug)]
#[command(name = "pokebattle", version, about = "Battle two pokemon fetched from PokeAPI")]
struct Args {
    /// First pokemon
    first: String,

    /// Second pokemon
    second: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible battles
    #[arg(long)]
    seed: Option<u64>,

    /// SQLite database for battle notes
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Skip the move catalog prefetch
    #[arg(long)]
    no_prefetch: bool,

    /// Print the battle summary as JSON
    #[arg(long)]
    json: bool,
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

    let mut config = Config::load(args.config.as_deref())?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(database) = &args.database {
        config.db_path = Some(database.display().to_string());
    }
    if args.no_prefetch {
        config.prefetch = false;
    }

    let mut arena = Arena::new(config).await?;
    arena.prepare().await;

    let summary = arena.battle(&args.first, &args.second).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match (summary.state, &summary.winner) {
        (BattleState::Won(_), Some(winner)) => println!(
            "The winner is: {} after {} turns ({:.2}s)",
            winner,
            summary.turns,
            summary.duration.as_secs_f64()
        ),
        _ => println!(
            "[DRAW] {} left with {:.2}HP, {} left with {:.2}HP",
            summary.first.name,
            summary.first.hit_points,
            summary.second.name,
            summary.second.hit_points
        ),
    }

    Ok(())
}
