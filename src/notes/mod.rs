//! Battle notes
//!
//! Records what happened in a battle for later analysis:
//! - One note per completed turn, with both combatants' active stat
//! - One closing note per battle, with winner and duration

mod store;

pub use store::NotesStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::combat::{BattleState, BattleSummary, CombatantSnapshot, Side};

/// Errors raised while recording notes
#[derive(Debug, Error)]
pub enum NotesError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Closing record of a battle
#[derive(Debug, Clone, PartialEq)]
pub struct BattleRecord {
    pub battle_id: Uuid,
    pub first: CombatantSnapshot,
    pub second: CombatantSnapshot,
    /// Combatant id of the winner; `None` for a draw
    pub winner_id: Option<i64>,
    pub duration_secs: f64,
    pub recorded_at: DateTime<Utc>,
}

impl BattleRecord {
    pub fn from_summary(summary: &BattleSummary) -> Self {
        let winner_id = match summary.state {
            BattleState::Won(Side::First) => Some(summary.first.combatant_id),
            BattleState::Won(Side::Second) => Some(summary.second.combatant_id),
            BattleState::Ongoing | BattleState::Draw => None,
        };

        Self {
            battle_id: summary.battle_id,
            first: summary.first.clone(),
            second: summary.second.clone(),
            winner_id,
            duration_secs: summary.duration.as_secs_f64(),
            recorded_at: Utc::now(),
        }
    }
}

/// Sink for battle analytics
#[async_trait]
pub trait BattleNotes: Send + Sync {
    /// Called after every turn both combatants survive
    async fn record_turn(
        &self,
        battle_id: Uuid,
        first: &CombatantSnapshot,
        second: &CombatantSnapshot,
    ) -> Result<(), NotesError>;

    /// Called once when the battle ends
    async fn record_battle(&self, record: &BattleRecord) -> Result<(), NotesError>;
}

/// Discards every note
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotes;

#[async_trait]
impl BattleNotes for NoNotes {
    async fn record_turn(
        &self,
        _battle_id: Uuid,
        _first: &CombatantSnapshot,
        _second: &CombatantSnapshot,
    ) -> Result<(), NotesError> {
        Ok(())
    }

    async fn record_battle(&self, _record: &BattleRecord) -> Result<(), NotesError> {
        Ok(())
    }
}
