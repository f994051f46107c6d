//! pokebattle - turn-based Pokemon battle simulator
//!
//! Two pokemon fetched from PokeAPI fight at level 1 until one faints, with
//! optional analytics notes kept in SQLite.

pub mod catalog;
pub mod combat;
pub mod config;
pub mod db;
pub mod init;
pub mod notes;
pub mod pokeapi;

use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use catalog::{MoveCatalog, PrefetchReport};
use combat::{Battle, BattleSummary, Combatant};
use db::Database;
use notes::{BattleNotes, NoNotes, NotesStore};
use pokeapi::{CatalogSource, PokeApiClient};

pub use config::Config;

/// Owns everything that outlives a single battle
pub struct Arena {
    config: Config,
    source: Arc<dyn CatalogSource>,
    catalog: MoveCatalog,
    notes: Option<NotesStore>,
    /// Seeds one generator per battle
    rng: StdRng,
}

impl Arena {
    /// Create an arena backed by PokeAPI
    pub async fn new(config: Config) -> Result<Self> {
        let client = PokeApiClient::shared(&config.api_url, config.request_timeout())?;
        Self::with_source(config, client).await
    }

    /// Create an arena backed by any catalog source
    pub async fn with_source(config: Config, source: Arc<dyn CatalogSource>) -> Result<Self> {
        let notes = match config.db_path.as_deref() {
            Some(path) => {
                let db = Database::new(Some(path)).await?;
                Some(NotesStore::new(db.pool().clone()))
            }
            None => None,
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            config,
            source,
            catalog: MoveCatalog::new(),
            notes,
            rng,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &MoveCatalog {
        &self.catalog
    }

    pub fn notes(&self) -> Option<&NotesStore> {
        self.notes.as_ref()
    }

    /// Prefetch the move catalog if configured to
    pub async fn prepare(&mut self) -> PrefetchReport {
        if !self.config.prefetch {
            info!("Skipping move catalog prefetch");
            return PrefetchReport::default();
        }
        self.catalog.prefetch(self.source.as_ref()).await
    }

    /// Fetch two pokemon by name and battle them
    pub async fn battle(&mut self, first: &str, second: &str) -> Result<BattleSummary> {
        info!("Preparing {} and {}", first, second);
        let first = Combatant::from_template(self.source.fetch_combatant_template(first).await?)?;
        let second =
            Combatant::from_template(self.source.fetch_combatant_template(second).await?)?;

        let rng = StdRng::seed_from_u64(self.rng.random());
        let notes: &dyn BattleNotes = match &self.notes {
            Some(store) => store,
            None => &NoNotes,
        };

        let mut battle = Battle::new(first, second, &mut self.catalog, self.source.as_ref(), rng)
            .with_max_turn_errors(self.config.max_turn_errors);
        Ok(battle.run(notes).await)
    }
}
