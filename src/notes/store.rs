//! SQLite-backed battle notes
//!
//! Dimension rows (moves, pokemon, stat bindings) are written once and
//! looked up afterwards; every note adds one attack fact per combatant and
//! one battle fact tying them together. A note is written in one transaction,
//! so a failed write leaves no rows behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{BattleNotes, BattleRecord, NotesError};
use crate::combat::CombatantSnapshot;

/// Battle notes persisted to the analytics database
#[derive(Debug, Clone)]
pub struct NotesStore {
    pool: SqlitePool,
}

/// Everything written for one note
struct Note<'a> {
    battle_id: Uuid,
    first: &'a CombatantSnapshot,
    second: &'a CombatantSnapshot,
    /// Set only on the closing note
    duration_secs: Option<f64>,
    winner_id: Option<i64>,
    recorded_at: DateTime<Utc>,
}

/// Row ids written for one combatant
struct CombatantRows {
    pokemon_id: i64,
    attack_id: i64,
}

impl NotesStore {
    /// Create a new store over `pool`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of battle facts recorded for `battle_id`
    pub async fn battle_fact_count(&self, battle_id: Uuid) -> Result<i64, NotesError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM fact_battle WHERE battle_id = ?")
            .bind(battle_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Write one note in a single transaction
    async fn write(&self, note: Note<'_>) -> Result<(), NotesError> {
        let mut tx = self.pool.begin().await?;
        match insert_note(&mut *tx, &note).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BattleNotes for NotesStore {
    async fn record_turn(
        &self,
        battle_id: Uuid,
        first: &CombatantSnapshot,
        second: &CombatantSnapshot,
    ) -> Result<(), NotesError> {
        self.write(Note {
            battle_id,
            first,
            second,
            duration_secs: None,
            winner_id: None,
            recorded_at: Utc::now(),
        })
        .await
    }

    async fn record_battle(&self, record: &BattleRecord) -> Result<(), NotesError> {
        debug!(
            "Recording battle {} ({:.2}s)",
            record.battle_id, record.duration_secs
        );
        self.write(Note {
            battle_id: record.battle_id,
            first: &record.first,
            second: &record.second,
            duration_secs: Some(record.duration_secs),
            winner_id: record.winner_id,
            recorded_at: record.recorded_at,
        })
        .await
    }
}

async fn insert_note(conn: &mut SqliteConnection, note: &Note<'_>) -> Result<(), NotesError> {
    let first_rows = write_combatant(conn, note.first).await?;
    let second_rows = write_combatant(conn, note.second).await?;

    let winner_row = match note.winner_id {
        Some(id) if id == note.first.combatant_id => Some(first_rows.pokemon_id),
        Some(id) if id == note.second.combatant_id => Some(second_rows.pokemon_id),
        _ => None,
    };

    sqlx::query(
        "INSERT INTO fact_battle
         (battle_id, date_time, pokemon_id_1, pokemon_id_2, attack_id_1, attack_id_2, battle_duration, winner_pokemon_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(note.battle_id.to_string())
    .bind(note.recorded_at.to_rfc3339())
    .bind(first_rows.pokemon_id)
    .bind(second_rows.pokemon_id)
    .bind(first_rows.attack_id)
    .bind(second_rows.attack_id)
    .bind(note.duration_secs)
    .bind(winner_row)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn write_combatant(
    conn: &mut SqliteConnection,
    snap: &CombatantSnapshot,
) -> Result<CombatantRows, NotesError> {
    sqlx::query("INSERT OR IGNORE INTO dim_pokemon (poke_id, name, speed) VALUES (?, ?, ?)")
        .bind(snap.combatant_id)
        .bind(&snap.name)
        .bind(snap.speed)
        .execute(&mut *conn)
        .await?;
    let pokemon_id: i64 = sqlx::query_scalar("SELECT id FROM dim_pokemon WHERE poke_id = ?")
        .bind(snap.combatant_id)
        .fetch_one(&mut *conn)
        .await?;

    let (move_id, stat_id) = match &snap.active {
        Some(active) => {
            sqlx::query("INSERT OR IGNORE INTO dim_move (name, power) VALUES (?, ?)")
                .bind(&active.move_name)
                .bind(active.power)
                .execute(&mut *conn)
                .await?;
            let move_id: i64 = sqlx::query_scalar("SELECT id FROM dim_move WHERE name = ?")
                .bind(&active.move_name)
                .fetch_one(&mut *conn)
                .await?;

            let stat_name = active.stat_type.as_deref().unwrap_or_default();
            sqlx::query("INSERT OR IGNORE INTO dim_stat (name, change, move_id) VALUES (?, ?, ?)")
                .bind(stat_name)
                .bind(active.stage_change)
                .bind(move_id)
                .execute(&mut *conn)
                .await?;
            let stat_id: i64 =
                sqlx::query_scalar("SELECT id FROM dim_stat WHERE name = ? AND move_id = ?")
                    .bind(stat_name)
                    .bind(move_id)
                    .fetch_one(&mut *conn)
                    .await?;

            (Some(move_id), Some(stat_id))
        }
        None => (None, None),
    };

    let active = snap.active.as_ref();
    let attack_id = sqlx::query(
        "INSERT INTO fact_attack
         (pokemon_id, move_id, stat_id, stat_changed, effort_ev, iv, level, nature_modifier, hp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(pokemon_id)
    .bind(move_id)
    .bind(stat_id)
    .bind(active.map(|a| a.stat_value))
    .bind(active.map(|a| a.effort_value))
    .bind(active.map(|a| a.individual_value))
    .bind(active.map(|a| a.level))
    .bind(active.map(|a| a.nature_modifier))
    .bind(snap.hit_points)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(CombatantRows {
        pokemon_id,
        attack_id,
    })
}
