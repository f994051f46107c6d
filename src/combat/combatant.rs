//! Combatants and move selection

use std::collections::{BTreeMap, HashMap};

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::error::CombatError;
use super::stat::{Move, StatInstance, GENERIC_BASE_VALUE, GENERIC_EFFORT_VALUE};
use crate::catalog::MoveCatalog;
use crate::pokeapi::{CatalogSource, CombatantTemplate};

/// Which stat a multi-stat move should resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Attack,
    Defense,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Attack => "attack",
            Role::Defense => "defense",
        }
    }
}

/// Base value and effort value of one stat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseStat {
    pub base: f64,
    pub effort: i64,
}

/// A combatant's stats, keyed by stat name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTable {
    stats: BTreeMap<String, BaseStat>,
}

impl StatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stat (builder style)
    pub fn with(mut self, name: &str, base: f64, effort: i64) -> Self {
        self.stats.insert(name.to_string(), BaseStat { base, effort });
        self
    }

    pub fn get(&self, name: &str) -> Option<BaseStat> {
        self.stats.get(name).copied()
    }

    /// Stat names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.stats.keys()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

impl FromIterator<(String, (f64, i64))> for StatTable {
    fn from_iter<I: IntoIterator<Item = (String, (f64, i64))>>(iter: I) -> Self {
        Self {
            stats: iter
                .into_iter()
                .map(|(name, (base, effort))| (name, BaseStat { base, effort }))
                .collect(),
        }
    }
}

/// Point-in-time view of a combatant for the analytics sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantSnapshot {
    pub combatant_id: i64,
    pub name: String,
    pub speed: f64,
    pub hit_points: f64,
    /// Present once the combatant has selected a move
    pub active: Option<MoveSnapshot>,
}

/// The active stat instance of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveSnapshot {
    pub move_name: String,
    pub power: Option<i64>,
    pub stage_change: i32,
    pub stat_type: Option<String>,
    pub stat_value: f64,
    pub effort_value: i64,
    pub individual_value: f64,
    pub level: i64,
    pub nature_modifier: f64,
}

impl From<&StatInstance> for MoveSnapshot {
    fn from(inst: &StatInstance) -> Self {
        Self {
            move_name: inst.move_.name.clone(),
            power: inst.move_.power,
            stage_change: inst.move_.stage_change,
            stat_type: inst.stat_type.clone(),
            stat_value: inst.stat_value,
            effort_value: inst.effort_value,
            individual_value: inst.individual_value,
            level: inst.level,
            nature_modifier: inst.nature_modifier,
        }
    }
}

/// A battle participant
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: i64,
    pub name: String,
    /// Move names; duplicates weight the random choice
    move_pool: Vec<String>,
    /// Current hit points, may go negative
    pub hit_points: f64,
    speed: f64,
    stats: StatTable,
    /// Key into `history` of the active instance
    active: Option<String>,
    /// One stat instance per move name ever selected
    history: HashMap<String, StatInstance>,
}

impl Combatant {
    /// Create a combatant; `hp` and `speed` must be in the stat table
    pub fn new(
        id: i64,
        name: &str,
        move_pool: Vec<String>,
        stats: StatTable,
    ) -> Result<Self, CombatError> {
        let required = |stat: &str| {
            stats.get(stat).ok_or_else(|| CombatError::MissingStat {
                combatant: name.to_string(),
                stat: stat.to_string(),
            })
        };
        let hit_points = required("hp")?.base;
        let speed = required("speed")?.base;

        if move_pool.is_empty() {
            return Err(CombatError::EmptyMovePool(name.to_string()));
        }

        Ok(Self {
            id,
            name: name.to_string(),
            move_pool,
            hit_points,
            speed,
            stats,
            active: None,
            history: HashMap::new(),
        })
    }

    /// Build a combatant from a fetched template
    pub fn from_template(template: CombatantTemplate) -> Result<Self, CombatError> {
        let stats = template.stats.into_iter().collect();
        Self::new(template.id, &template.name, template.move_names, stats)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn stats(&self) -> &StatTable {
        &self.stats
    }

    pub fn move_pool(&self) -> &[String] {
        &self.move_pool
    }

    pub fn is_defeated(&self) -> bool {
        self.hit_points <= 0.0
    }

    /// The most recently selected stat instance
    pub fn active_instance(&self) -> Option<&StatInstance> {
        self.active.as_ref().and_then(|name| self.history.get(name))
    }

    pub fn active_instance_mut(&mut self) -> Result<&mut StatInstance, CombatError> {
        self.active
            .as_ref()
            .and_then(|name| self.history.get_mut(name))
            .ok_or_else(|| CombatError::NoActiveMove(self.name.clone()))
    }

    /// Previously created instance for `move_name`
    pub fn instance_for(&self, move_name: &str) -> Option<&StatInstance> {
        self.history.get(move_name)
    }

    /// Number of distinct moves selected so far
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Pick a move at random and make its stat instance active
    ///
    /// A move seen before reuses its instance, including any stage changes
    /// already applied to it. Unseen moves are resolved through `catalog`.
    pub async fn select_move<R: Rng + ?Sized>(
        &mut self,
        catalog: &mut MoveCatalog,
        source: &dyn CatalogSource,
        role: Role,
        rng: &mut R,
    ) -> Result<&StatInstance, CombatError> {
        let move_name = self
            .move_pool
            .choose(rng)
            .cloned()
            .ok_or_else(|| CombatError::EmptyMovePool(self.name.clone()))?;

        if self.active.as_deref() != Some(move_name.as_str()) {
            if !self.history.contains_key(&move_name) {
                let instance = self
                    .create_instance(catalog, source, &move_name, role, rng)
                    .await?;
                self.history.insert(move_name.clone(), instance);
            }
            self.active = Some(move_name);
        }

        self.active_instance()
            .ok_or_else(|| CombatError::NoActiveMove(self.name.clone()))
    }

    async fn create_instance<R: Rng + ?Sized>(
        &self,
        catalog: &mut MoveCatalog,
        source: &dyn CatalogSource,
        move_name: &str,
        role: Role,
        rng: &mut R,
    ) -> Result<StatInstance, CombatError> {
        let resolution = catalog
            .resolve(source, &self.name, move_name, role, self.stats.names())
            .await?;
        let move_ = Move::new(
            move_name,
            resolution.effect.power,
            resolution.effect.stage_change,
        );

        let (base, effort) = match resolution
            .stat_name
            .as_deref()
            .and_then(|stat| self.stats.get(stat))
        {
            Some(stat) => (stat.base, stat.effort),
            None => (GENERIC_BASE_VALUE, GENERIC_EFFORT_VALUE),
        };

        debug!(
            "{} binds {} to {:?} (base {}, effort {})",
            self.name, move_name, resolution.stat_name, base, effort
        );

        Ok(StatInstance::new(
            &self.name,
            resolution.stat_name,
            base,
            effort,
            move_,
            rng,
        ))
    }

    /// Snapshot for the analytics sink
    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            combatant_id: self.id,
            name: self.name.clone(),
            speed: self.speed,
            hit_points: self.hit_points,
            active: self.active_instance().map(MoveSnapshot::from),
        }
    }
}
