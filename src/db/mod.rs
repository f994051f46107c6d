//! Database module - SQLite store for battle analytics

#[cfg(test)]
pub mod test_utils;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Database handle wrapping SQLite connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    /// If path is None, uses in-memory database (for testing)
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn_str = match path {
            Some(p) => format!("sqlite:{}?mode=rwc", p),
            None => "sqlite::memory:".to_string(),
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        // Dimensions
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dim_move (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                power INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dim_pokemon (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                poke_id INTEGER UNIQUE NOT NULL,
                name TEXT NOT NULL,
                speed REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dim_stat (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL DEFAULT '',
                change INTEGER NOT NULL,
                move_id INTEGER NOT NULL REFERENCES dim_move(id),
                UNIQUE(name, move_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Facts
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fact_attack (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pokemon_id INTEGER NOT NULL REFERENCES dim_pokemon(id),
                move_id INTEGER REFERENCES dim_move(id),
                stat_id INTEGER REFERENCES dim_stat(id),
                stat_changed REAL,
                effort_ev INTEGER,
                iv REAL,
                level INTEGER,
                nature_modifier REAL,
                hp REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fact_battle (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                battle_id TEXT NOT NULL,
                date_time TEXT NOT NULL,
                pokemon_id_1 INTEGER NOT NULL REFERENCES dim_pokemon(id),
                pokemon_id_2 INTEGER NOT NULL REFERENCES dim_pokemon(id),
                attack_id_1 INTEGER NOT NULL REFERENCES fact_attack(id),
                attack_id_2 INTEGER NOT NULL REFERENCES fact_attack(id),
                battle_duration REAL,
                winner_pokemon_id INTEGER REFERENCES dim_pokemon(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_fact_attack_pokemon ON fact_attack(pokemon_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_fact_battle_battle ON fact_battle(battle_id)")
            .execute(&self.pool)
            .await?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
