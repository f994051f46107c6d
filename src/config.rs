//! Configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `POKEBATTLE_*` environment variables.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::combat::DEFAULT_MAX_TURN_ERRORS;
use crate::pokeapi::DEFAULT_API_URL;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "POKEBATTLE_";

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// PokeAPI base URL
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Analytics database; None = no notes are kept
    pub db_path: Option<String>,
    /// Seed for every random draw; None = seeded from the OS
    pub seed: Option<u64>,
    /// Failed turns tolerated before a draw
    pub max_turn_errors: u32,
    /// Fill the move catalog from every stat category at startup
    pub prefetch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            db_path: None,
            seed: None,
            max_turn_errors: DEFAULT_MAX_TURN_ERRORS,
            prefetch: true,
        }
    }
}

impl Config {
    /// Load configuration, reading `path` if given
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// The provider stack behind `load`
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
