//! Move catalog
//!
//! Resolves move names to power and stage change:
//! - Single-valued entries for moves fetched on demand
//! - Per-stat entries filled by the bulk prefetch
//! - Role hints pick among the stats a move touches

use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::combat::{CombatError, Role};
use crate::pokeapi::{CatalogSource, StatCategory};

/// Largest stage change in either direction
pub const MAX_STAGE: i32 = 6;

/// Power and stage change of a move against one stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEffect {
    /// `None` for status moves
    pub power: Option<i64>,
    /// Stage change in [-6, 6]
    pub stage_change: i32,
}

impl MoveEffect {
    pub fn new(power: Option<i64>, stage_change: i32) -> Self {
        Self {
            power,
            stage_change: stage_change.clamp(-MAX_STAGE, MAX_STAGE),
        }
    }
}

/// What the catalog knows about one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    /// Applies generically, to no particular stat
    Simple(MoveEffect),
    /// Applies differently to each listed stat
    PerStat(BTreeMap<String, MoveEffect>),
}

/// Outcome of resolving a move for a combatant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub effect: MoveEffect,
    /// Set only when a per-stat entry was resolved
    pub stat_name: Option<String>,
}

/// Summary of a bulk prefetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Stat categories listed by the source
    pub categories: usize,
    /// Categories that could not be fetched
    pub failed_categories: usize,
    /// Moves newly added to the catalog
    pub moves_added: usize,
}

/// Insert-only cache of move effects
#[derive(Debug, Clone, Default)]
pub struct MoveCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl MoveCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known moves
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, move_name: &str) -> bool {
        self.entries.contains_key(move_name)
    }

    pub fn get(&self, move_name: &str) -> Option<&CatalogEntry> {
        self.entries.get(move_name)
    }

    /// Record an entry unless the move is already known
    ///
    /// Returns false when an entry already existed.
    pub fn insert(&mut self, move_name: &str, entry: CatalogEntry) -> bool {
        if self.entries.contains_key(move_name) {
            return false;
        }
        self.entries.insert(move_name.to_string(), entry);
        true
    }

    /// Resolve `move_name` for a combatant owning `stat_names`
    ///
    /// Unknown moves are fetched from `source` and recorded as single-valued
    /// entries with no stage change.
    pub async fn resolve<'a>(
        &mut self,
        source: &dyn CatalogSource,
        combatant: &str,
        move_name: &str,
        role: Role,
        stat_names: impl IntoIterator<Item = &'a String>,
    ) -> Result<Resolution, CombatError> {
        if !self.entries.contains_key(move_name) {
            let detail = source.fetch_move_detail(move_name).await?;
            let effect = MoveEffect::new(detail.power, 0);
            debug!("Fetched unseen move {}: {:?}", move_name, effect);
            self.entries
                .insert(move_name.to_string(), CatalogEntry::Simple(effect));
            return Ok(Resolution {
                effect,
                stat_name: None,
            });
        }

        match &self.entries[move_name] {
            CatalogEntry::Simple(effect) => Ok(Resolution {
                effect: *effect,
                stat_name: None,
            }),
            CatalogEntry::PerStat(by_stat) => {
                let owned: BTreeSet<&String> = stat_names.into_iter().collect();
                let common: Vec<&String> =
                    by_stat.keys().filter(|k| owned.contains(k)).collect();

                let chosen = common
                    .iter()
                    .find(|k| k.contains(role.as_str()))
                    .or_else(|| common.first())
                    .ok_or_else(|| CombatError::StatMismatch {
                        combatant: combatant.to_string(),
                        move_name: move_name.to_string(),
                    })?;

                Ok(Resolution {
                    effect: by_stat[chosen.as_str()],
                    stat_name: Some(chosen.to_string()),
                })
            }
        }
    }

    /// Fill the catalog from every stat category the source knows
    ///
    /// Categories are fetched concurrently, then the details of every move
    /// not yet in the catalog, each fetched once however many categories
    /// list it. Failures are logged and leave the corresponding contribution
    /// out.
    pub async fn prefetch(&mut self, source: &dyn CatalogSource) -> PrefetchReport {
        let stats = match source.fetch_stat_list().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Failed to list stat categories: {}", e);
                return PrefetchReport::default();
            }
        };

        let fetched = join_all(
            stats
                .iter()
                .map(|stat| source.fetch_stat_category(&stat.name)),
        )
        .await;

        let mut report = PrefetchReport {
            categories: stats.len(),
            ..Default::default()
        };

        let mut categories: Vec<(&str, StatCategory)> = Vec::with_capacity(stats.len());
        for (stat, result) in stats.iter().zip(fetched) {
            match result {
                Ok(category) => categories.push((stat.name.as_str(), category)),
                Err(e) => {
                    warn!("Failed to fetch stat category {}: {}", stat.name, e);
                    report.failed_categories += 1;
                }
            }
        }

        let unseen: BTreeSet<&str> = categories
            .iter()
            .flat_map(|(_, category)| category.affecting_moves())
            .map(|m| m.move_ref.name.as_str())
            .filter(|name| !self.entries.contains_key(*name))
            .collect();
        let powers = fetch_powers(source, unseen).await;

        for (stat_name, category) in &categories {
            for affecting in category.affecting_moves() {
                let move_name = affecting.move_ref.name.as_str();
                let power = match powers.get(move_name) {
                    Some(power) => *power,
                    // Known entries keep their recorded power
                    None if self.entries.contains_key(move_name) => None,
                    None => continue,
                };
                if self.merge(stat_name, move_name, MoveEffect::new(power, affecting.change)) {
                    report.moves_added += 1;
                }
            }
        }

        info!(
            "Prefetched {} moves across {} stat categories ({} failed)",
            report.moves_added, report.categories, report.failed_categories
        );
        report
    }

    /// File `move_name` under `stat_name`; returns true for a new move
    fn merge(&mut self, stat_name: &str, move_name: &str, effect: MoveEffect) -> bool {
        match self.entries.get_mut(move_name) {
            None => {
                let by_stat = BTreeMap::from([(stat_name.to_string(), effect)]);
                self.entries
                    .insert(move_name.to_string(), CatalogEntry::PerStat(by_stat));
                true
            }
            Some(CatalogEntry::PerStat(by_stat)) => {
                if !by_stat.contains_key(stat_name) {
                    // The first recorded power wins across stats
                    let power = by_stat.values().next().map_or(effect.power, |e| e.power);
                    by_stat.insert(
                        stat_name.to_string(),
                        MoveEffect::new(power, effect.stage_change),
                    );
                }
                false
            }
            Some(CatalogEntry::Simple(_)) => false,
        }
    }
}

/// Power of each named move; moves that fail to fetch are left out
async fn fetch_powers(
    source: &dyn CatalogSource,
    move_names: BTreeSet<&str>,
) -> HashMap<String, Option<i64>> {
    let details = join_all(
        move_names
            .iter()
            .map(|name| source.fetch_move_detail(name)),
    )
    .await;

    let mut powers = HashMap::with_capacity(details.len());
    for (move_name, detail) in move_names.into_iter().zip(details) {
        match detail {
            Ok(detail) => {
                powers.insert(move_name.to_string(), detail.power);
            }
            Err(e) => warn!("Skipping move {}: {}", move_name, e),
        }
    }
    powers
}
