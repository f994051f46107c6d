//! Common test utilities - in-memory catalog source and recording notes sink

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pokebattle::combat::{Combatant, CombatantSnapshot, StatTable};
use pokebattle::notes::{BattleNotes, BattleRecord, NotesError};
use pokebattle::pokeapi::{
    AffectingMove, CatalogSource, CombatantTemplate, FetchError, MoveDetail, NamedResource,
    StatCategory,
};
use uuid::Uuid;

/// Catalog source serving canned documents from memory
///
/// Unknown names answer `FetchError::NotFound`. Broken categories are listed
/// but fail to fetch, and flaky moves fail a fixed number of times first.
#[derive(Default)]
pub struct FakeSource {
    moves: HashMap<String, Option<i64>>,
    categories: BTreeMap<String, StatCategory>,
    broken_categories: BTreeSet<String>,
    templates: HashMap<String, CombatantTemplate>,
    flaky: Mutex<HashMap<String, usize>>,
    move_fetches: AtomicUsize,
    list_fails: bool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_move(mut self, name: &str, power: Option<i64>) -> Self {
        self.moves.insert(name.to_string(), power);
        self
    }

    /// Add a stat category listing `(move, change)` pairs
    pub fn with_category(
        mut self,
        stat: &str,
        increasing: &[(&str, i32)],
        decreasing: &[(&str, i32)],
    ) -> Self {
        let affecting = |moves: &[(&str, i32)]| {
            moves
                .iter()
                .map(|(name, change)| AffectingMove {
                    change: *change,
                    move_ref: NamedResource::new(name),
                })
                .collect()
        };
        self.categories.insert(
            stat.to_string(),
            StatCategory {
                name: stat.to_string(),
                increasing_moves: affecting(increasing),
                decreasing_moves: affecting(decreasing),
            },
        );
        self
    }

    pub fn with_broken_category(mut self, stat: &str) -> Self {
        self.broken_categories.insert(stat.to_string());
        self
    }

    pub fn with_failing_stat_list(mut self) -> Self {
        self.list_fails = true;
        self
    }

    /// Add a pokemon with hp, speed, attack and defense stats
    pub fn with_pokemon(mut self, id: i64, name: &str, hp: f64, speed: f64, moves: &[&str]) -> Self {
        let stats = BTreeMap::from([
            ("hp".to_string(), (hp, 0)),
            ("speed".to_string(), (speed, 0)),
            ("attack".to_string(), (49.0, 0)),
            ("defense".to_string(), (49.0, 0)),
        ]);
        self.templates.insert(
            name.to_string(),
            CombatantTemplate {
                id,
                name: name.to_string(),
                move_names: moves.iter().map(|m| m.to_string()).collect(),
                stats,
            },
        );
        self
    }

    /// Make `name` fail its next `failures` detail fetches
    pub fn with_flaky_move(self, name: &str, failures: usize) -> Self {
        self.flaky
            .lock()
            .unwrap()
            .insert(name.to_string(), failures);
        self
    }

    /// Number of move detail fetches served or refused so far
    pub fn move_fetches(&self) -> usize {
        self.move_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeSource {
    async fn fetch_move_detail(&self, name: &str) -> Result<MoveDetail, FetchError> {
        self.move_fetches.fetch_add(1, Ordering::SeqCst);

        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(remaining) = flaky.get_mut(name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Status {
                        url: format!("fake://move/{}", name),
                        status: 503,
                    });
                }
            }
        }

        match self.moves.get(name) {
            Some(power) => Ok(MoveDetail {
                name: name.to_string(),
                power: *power,
            }),
            None => Err(FetchError::NotFound(format!("fake://move/{}", name))),
        }
    }

    async fn fetch_stat_list(&self) -> Result<Vec<NamedResource>, FetchError> {
        if self.list_fails {
            return Err(FetchError::Status {
                url: "fake://stat".to_string(),
                status: 500,
            });
        }
        Ok(self
            .categories
            .keys()
            .chain(self.broken_categories.iter())
            .map(|name| NamedResource::new(name))
            .collect())
    }

    async fn fetch_stat_category(&self, name: &str) -> Result<StatCategory, FetchError> {
        if self.broken_categories.contains(name) {
            return Err(FetchError::Decode {
                url: format!("fake://stat/{}", name),
                reason: "truncated document".to_string(),
            });
        }
        self.categories
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("fake://stat/{}", name)))
    }

    async fn fetch_combatant_template(&self, name: &str) -> Result<CombatantTemplate, FetchError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("fake://pokemon/{}", name)))
    }
}

/// Notes sink that keeps everything in memory
#[derive(Default)]
pub struct RecordingNotes {
    pub turns: Mutex<Vec<(Uuid, CombatantSnapshot, CombatantSnapshot)>>,
    pub battles: Mutex<Vec<BattleRecord>>,
}

impl RecordingNotes {
    pub fn turn_count(&self) -> usize {
        self.turns.lock().unwrap().len()
    }

    pub fn battles(&self) -> Vec<BattleRecord> {
        self.battles.lock().unwrap().clone()
    }
}

#[async_trait]
impl BattleNotes for RecordingNotes {
    async fn record_turn(
        &self,
        battle_id: Uuid,
        first: &CombatantSnapshot,
        second: &CombatantSnapshot,
    ) -> Result<(), NotesError> {
        self.turns
            .lock()
            .unwrap()
            .push((battle_id, first.clone(), second.clone()));
        Ok(())
    }

    async fn record_battle(&self, record: &BattleRecord) -> Result<(), NotesError> {
        self.battles.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Combatant with hp, speed, attack and defense stats
pub fn combatant(id: i64, name: &str, hp: f64, speed: f64, moves: &[&str]) -> Combatant {
    let stats = StatTable::new()
        .with("hp", hp, 0)
        .with("speed", speed, 0)
        .with("attack", 49.0, 0)
        .with("defense", 49.0, 0);
    Combatant::new(
        id,
        name,
        moves.iter().map(|m| m.to_string()).collect(),
        stats,
    )
    .unwrap()
}
