//! PokeAPI integration
//!
//! Provides:
//! - The `CatalogSource` seam the battle engine fetches through
//! - Wire documents for moves, stat categories and pokemon
//! - A reqwest-backed client for the public API

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Default PokeAPI endpoint
pub const DEFAULT_API_URL: &str = "https://pokeapi.co/api/v2";

/// Errors raised while fetching catalog data
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error fetching {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),
}

/// A `{name, url}` pair as PokeAPI returns for linked resources
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl NamedResource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: String::new(),
        }
    }
}

/// Detail of a single move; only power matters to the battle engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoveDetail {
    pub name: String,
    /// `None` for status moves
    pub power: Option<i64>,
}

/// A move that raises or lowers a stat by `change` stages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AffectingMove {
    pub change: i32,
    #[serde(rename = "move")]
    pub move_ref: NamedResource,
}

/// A stat category together with the moves affecting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCategory {
    pub name: String,
    pub increasing_moves: Vec<AffectingMove>,
    pub decreasing_moves: Vec<AffectingMove>,
}

impl StatCategory {
    /// Increasing moves first, then decreasing ones
    pub fn affecting_moves(&self) -> impl Iterator<Item = &AffectingMove> {
        self.increasing_moves.iter().chain(self.decreasing_moves.iter())
    }
}

/// Everything needed to build a combatant
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantTemplate {
    pub id: i64,
    pub name: String,
    pub move_names: Vec<String>,
    /// stat name -> (base value, effort value)
    pub stats: BTreeMap<String, (f64, i64)>,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct StatDocument {
    name: String,
    affecting_moves: AffectingMoves,
}

#[derive(Debug, Deserialize)]
struct AffectingMoves {
    #[serde(default)]
    increase: Vec<AffectingMove>,
    #[serde(default)]
    decrease: Vec<AffectingMove>,
}

#[derive(Debug, Deserialize)]
struct PokemonDocument {
    id: i64,
    name: String,
    #[serde(default)]
    moves: Vec<PokemonMove>,
    #[serde(default)]
    stats: Vec<PokemonStat>,
}

#[derive(Debug, Deserialize)]
struct PokemonMove {
    #[serde(rename = "move")]
    move_ref: NamedResource,
}

#[derive(Debug, Deserialize)]
struct PokemonStat {
    base_stat: f64,
    effort: i64,
    stat: NamedResource,
}

impl From<StatDocument> for StatCategory {
    fn from(doc: StatDocument) -> Self {
        Self {
            name: doc.name,
            increasing_moves: doc.affecting_moves.increase,
            decreasing_moves: doc.affecting_moves.decrease,
        }
    }
}

impl From<PokemonDocument> for CombatantTemplate {
    fn from(doc: PokemonDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            move_names: doc.moves.into_iter().map(|m| m.move_ref.name).collect(),
            stats: doc
                .stats
                .into_iter()
                .map(|s| (s.stat.name, (s.base_stat, s.effort)))
                .collect(),
        }
    }
}

/// Where raw catalog and combatant data comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Detail of one move, by name
    async fn fetch_move_detail(&self, name: &str) -> Result<MoveDetail, FetchError>;
    /// Every known stat category
    async fn fetch_stat_list(&self) -> Result<Vec<NamedResource>, FetchError>;
    /// One stat category with its affecting moves
    async fn fetch_stat_category(&self, name: &str) -> Result<StatCategory, FetchError>;
    /// Template for a combatant, by pokemon name
    async fn fetch_combatant_template(&self, name: &str) -> Result<CombatantTemplate, FetchError>;
}

/// PokeAPI client
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    /// HTTP client
    client: Client,
    /// API base URL, without trailing slash
    base_url: String,
}

impl PokeApiClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Http {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a shared instance
    pub fn shared(base_url: &str, timeout: Duration) -> Result<Arc<Self>, FetchError> {
        Ok(Arc::new(Self::new(base_url, timeout)?))
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, kind: &str, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind, normalize_name(name))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("PokeAPI error: {} - {}", url, status);
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url));
            }
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;

        decode(&url, &body)
    }
}

#[async_trait]
impl CatalogSource for PokeApiClient {
    async fn fetch_move_detail(&self, name: &str) -> Result<MoveDetail, FetchError> {
        self.get_json(self.endpoint("move", name)).await
    }

    async fn fetch_stat_list(&self) -> Result<Vec<NamedResource>, FetchError> {
        let list: ResourceList = self.get_json(format!("{}/stat", self.base_url)).await?;
        Ok(list.results)
    }

    async fn fetch_stat_category(&self, name: &str) -> Result<StatCategory, FetchError> {
        let doc: StatDocument = self.get_json(self.endpoint("stat", name)).await?;
        Ok(doc.into())
    }

    async fn fetch_combatant_template(&self, name: &str) -> Result<CombatantTemplate, FetchError> {
        let doc: PokemonDocument = self.get_json(self.endpoint("pokemon", name)).await?;
        Ok(doc.into())
    }
}

/// PokeAPI keys are lowercase and never padded
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_move_detail() {
        let detail: MoveDetail =
            decode("move/tackle", r#"{"name":"tackle","power":40,"pp":35}"#).unwrap();
        assert_eq!(detail.name, "tackle");
        assert_eq!(detail.power, Some(40));

        let status: MoveDetail =
            decode("move/growl", r#"{"name":"growl","power":null}"#).unwrap();
        assert_eq!(status.power, None);
    }

    #[test]
    fn test_decode_stat_category() {
        let body = r#"{
            "name": "attack",
            "affecting_moves": {
                "increase": [
                    {"change": 2, "move": {"name": "swords-dance", "url": "https://pokeapi.co/api/v2/move/14/"}}
                ],
                "decrease": [
                    {"change": -1, "move": {"name": "growl", "url": "https://pokeapi.co/api/v2/move/45/"}}
                ]
            }
        }"#;
        let doc: StatDocument = decode("stat/attack", body).unwrap();
        let category = StatCategory::from(doc);

        assert_eq!(category.name, "attack");
        let names: Vec<_> = category
            .affecting_moves()
            .map(|m| (m.move_ref.name.as_str(), m.change))
            .collect();
        assert_eq!(names, vec![("swords-dance", 2), ("growl", -1)]);
    }

    #[test]
    fn test_decode_pokemon_template() {
        let body = r#"{
            "id": 25,
            "name": "pikachu",
            "moves": [
                {"move": {"name": "thunder-shock", "url": ""}},
                {"move": {"name": "growl", "url": ""}}
            ],
            "stats": [
                {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": ""}},
                {"base_stat": 90, "effort": 2, "stat": {"name": "speed", "url": ""}}
            ]
        }"#;
        let doc: PokemonDocument = decode("pokemon/pikachu", body).unwrap();
        let template = CombatantTemplate::from(doc);

        assert_eq!(template.id, 25);
        assert_eq!(template.move_names, vec!["thunder-shock", "growl"]);
        assert_eq!(template.stats.get("hp"), Some(&(35.0, 0)));
        assert_eq!(template.stats.get("speed"), Some(&(90.0, 2)));
    }

    #[test]
    fn test_decode_failure() {
        let result: Result<MoveDetail, _> = decode("move/x", "not json");
        assert!(matches!(result, Err(FetchError::Decode { .. })));
    }

    #[test]
    fn test_stat_list_defaults_to_empty() {
        let list: ResourceList = decode("stat", "{}").unwrap();
        assert!(list.results.is_empty());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Pikachu "), "pikachu");
    }

    #[test]
    fn test_endpoint_building() {
        let client = PokeApiClient::new("https://pokeapi.co/api/v2/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://pokeapi.co/api/v2");
        assert_eq!(
            client.endpoint("pokemon", "Bulbasaur"),
            "https://pokeapi.co/api/v2/pokemon/bulbasaur"
        );
    }
}
