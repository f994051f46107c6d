//! Combat errors

use thiserror::Error;

use crate::pokeapi::FetchError;

/// Errors that abandon a move selection or a turn
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("stats mismatch for pokemon {combatant} and move {move_name}")]
    StatMismatch { combatant: String, move_name: String },

    #[error("degenerate stat for pokemon {combatant} using move {move_name}")]
    DegenerateStat { combatant: String, move_name: String },

    #[error("pokemon {combatant} has no {stat} stat")]
    MissingStat { combatant: String, stat: String },

    #[error("pokemon {0} has no usable moves")]
    EmptyMovePool(String),

    #[error("pokemon {0} has not selected a move")]
    NoActiveMove(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
