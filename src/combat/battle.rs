//! Battle loop
//!
//! Two combatants trade blows until one is defeated. Turn order is fixed at
//! the start: the faster combatant attacks first, and on equal speed the
//! second-named combatant does. Failed turns are abandoned and counted; once
//! the count exceeds the error budget the battle is a draw.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::combatant::{Combatant, CombatantSnapshot, Role};
use super::error::CombatError;
use crate::catalog::MoveCatalog;
use crate::notes::{BattleNotes, BattleRecord};
use crate::pokeapi::CatalogSource;

/// Errors tolerated before a battle is called a draw
pub const DEFAULT_MAX_TURN_ERRORS: u32 = 3;

/// Slot of a combatant, in the order they were named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

/// Overall battle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BattleState {
    Ongoing,
    Won(Side),
    Draw,
}

impl BattleState {
    pub fn is_over(&self) -> bool {
        !matches!(self, BattleState::Ongoing)
    }
}

/// Result of advancing the battle by one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Both combatants are still standing
    Continue,
    /// The turn failed and was counted against the error budget
    Abandoned,
    Won(Side),
    Draw,
}

/// Final report of a battle
#[derive(Debug, Clone, Serialize)]
pub struct BattleSummary {
    pub battle_id: Uuid,
    pub state: BattleState,
    pub winner: Option<String>,
    pub turns: u32,
    pub errors: u32,
    pub duration: Duration,
    pub first: CombatantSnapshot,
    pub second: CombatantSnapshot,
}

/// A battle between two combatants
pub struct Battle<'a> {
    id: Uuid,
    /// Indexed by `Side`
    combatants: [Combatant; 2],
    /// Acts first every turn
    leader: Side,
    catalog: &'a mut MoveCatalog,
    source: &'a dyn CatalogSource,
    rng: StdRng,
    max_turn_errors: u32,
    errors: u32,
    turns: u32,
    state: BattleState,
}

impl<'a> Battle<'a> {
    /// Set up a battle; turn order is decided here and never changes
    pub fn new(
        first: Combatant,
        second: Combatant,
        catalog: &'a mut MoveCatalog,
        source: &'a dyn CatalogSource,
        rng: StdRng,
    ) -> Self {
        let leader = if first.speed() > second.speed() {
            Side::First
        } else {
            Side::Second
        };

        Self {
            id: Uuid::new_v4(),
            combatants: [first, second],
            leader,
            catalog,
            source,
            rng,
            max_turn_errors: DEFAULT_MAX_TURN_ERRORS,
            errors: 0,
            turns: 0,
            state: BattleState::Ongoing,
        }
    }

    /// Override the error budget
    pub fn with_max_turn_errors(mut self, max_turn_errors: u32) -> Self {
        self.max_turn_errors = max_turn_errors;
        self
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    /// The combatant attacking first each turn
    pub fn leader(&self) -> Side {
        self.leader
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        &self.combatants[side.index()]
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Play one full turn without touching the error counter
    ///
    /// The leader strikes, then the other combatant strikes back if still
    /// standing.
    pub async fn play_turn(&mut self) -> Result<TurnOutcome, CombatError> {
        let leader = self.leader;
        let [first, second] = &mut self.combatants;
        let (attacker, defender) = match leader {
            Side::First => (first, second),
            Side::Second => (second, first),
        };

        strike(attacker, defender, &mut *self.catalog, self.source, &mut self.rng).await?;
        if defender.is_defeated() {
            return Ok(TurnOutcome::Won(leader));
        }

        strike(defender, attacker, &mut *self.catalog, self.source, &mut self.rng).await?;
        if attacker.is_defeated() {
            return Ok(TurnOutcome::Won(leader.opponent()));
        }

        Ok(TurnOutcome::Continue)
    }

    /// Play one turn and update the battle state
    ///
    /// Does nothing once the battle is over.
    pub async fn advance(&mut self) -> TurnOutcome {
        match self.state {
            BattleState::Won(side) => return TurnOutcome::Won(side),
            BattleState::Draw => return TurnOutcome::Draw,
            BattleState::Ongoing => {}
        }

        self.turns += 1;
        match self.play_turn().await {
            Ok(TurnOutcome::Won(side)) => {
                self.state = BattleState::Won(side);
                let winner = self.combatant(side);
                info!(
                    "The winner is: {} with {:.2}HP left",
                    winner.name, winner.hit_points
                );
                TurnOutcome::Won(side)
            }
            Ok(outcome) => {
                let [first, second] = &self.combatants;
                debug!(
                    "Turn {}: {} {:.2}HP, {} {:.2}HP",
                    self.turns, first.name, first.hit_points, second.name, second.hit_points
                );
                outcome
            }
            Err(e) => {
                self.errors += 1;
                warn!("Turn {} abandoned: {}", self.turns, e);

                if self.errors > self.max_turn_errors {
                    self.state = BattleState::Draw;
                    let [first, second] = &self.combatants;
                    info!(
                        "[DRAW] Too many errors, stopping the battle. {} left with {:.2}HP, {} left with {:.2}HP",
                        first.name, first.hit_points, second.name, second.hit_points
                    );
                    TurnOutcome::Draw
                } else {
                    TurnOutcome::Abandoned
                }
            }
        }
    }

    /// Run to completion, reporting every completed turn to `notes`
    pub async fn run(&mut self, notes: &dyn BattleNotes) -> BattleSummary {
        info!(
            "Battle starts: {} vs {}, {} attacks first",
            self.combatants[0].name,
            self.combatants[1].name,
            self.combatant(self.leader).name
        );
        let started = Instant::now();

        loop {
            match self.advance().await {
                TurnOutcome::Continue => {
                    let (first, second) = self.snapshots();
                    if let Err(e) = notes.record_turn(self.id, &first, &second).await {
                        warn!("Failed to record turn {}: {}", self.turns, e);
                    }
                }
                TurnOutcome::Abandoned => {}
                TurnOutcome::Won(_) | TurnOutcome::Draw => break,
            }
        }

        let summary = self.summary(started.elapsed());
        let record = BattleRecord::from_summary(&summary);
        if let Err(e) = notes.record_battle(&record).await {
            warn!("Failed to record battle {}: {}", record.battle_id, e);
        }
        summary
    }

    /// Snapshots of both combatants, first-named first
    pub fn snapshots(&self) -> (CombatantSnapshot, CombatantSnapshot) {
        (
            self.combatants[0].snapshot(),
            self.combatants[1].snapshot(),
        )
    }

    /// Report the battle as it stands
    pub fn summary(&self, duration: Duration) -> BattleSummary {
        let (first, second) = self.snapshots();
        let winner = match self.state {
            BattleState::Won(side) => Some(self.combatant(side).name.clone()),
            _ => None,
        };

        BattleSummary {
            battle_id: self.id,
            state: self.state,
            winner,
            turns: self.turns,
            errors: self.errors,
            duration,
            first,
            second,
        }
    }
}

/// One side's attack: both pick a move, then damage is applied
async fn strike<R: Rng + ?Sized>(
    attacker: &mut Combatant,
    defender: &mut Combatant,
    catalog: &mut MoveCatalog,
    source: &dyn CatalogSource,
    rng: &mut R,
) -> Result<(), CombatError> {
    attacker
        .select_move(catalog, source, Role::Attack, rng)
        .await?;
    defender
        .select_move(catalog, source, Role::Defense, rng)
        .await?;

    let damage = attacker
        .active_instance_mut()?
        .damage_against(defender.active_instance_mut()?, rng)?;
    defender.hit_points -= damage;

    debug!(
        "{} hits {} for {:.2}",
        attacker.name, defender.name, damage
    );
    Ok(())
}
