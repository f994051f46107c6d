//! Combat system module
//!
//! Implements level-1 Pokemon-style combat with:
//! - Stat derivation from base stat, effort, individual value and nature
//! - Stage boosts and drops that compound every time a move is reused
//! - Random move selection with a per-move stat instance cache
//! - A turn loop that ends in a win or, after repeated errors, a draw

mod battle;
mod combatant;
mod error;
mod stat;

pub use battle::{Battle, BattleState, BattleSummary, Side, TurnOutcome, DEFAULT_MAX_TURN_ERRORS};
pub use combatant::{BaseStat, Combatant, CombatantSnapshot, MoveSnapshot, Role, StatTable};
pub use error::CombatError;
pub use stat::{derive_stat, stage_multiplier, Move, StatInstance, LEVEL, STAGE_DROPS};
