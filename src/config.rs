//! Game configuration and the territory directory.
//!
//! The config file is the same JSON document the rest of the game tooling
//! reads, so keys stay camelCase (`initialArmies`, `abbr`, ...).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_INITIAL_ARMIES: i32 = 3;
pub const DEFAULT_MAX_ARMIES_PER_TERRITORY: i32 = 5;

/// Numeric policy and map data for one game.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Postgres connection string, used by [`crate::Referee::connect`].
    pub database_url: Option<String>,
    /// Armies placed in a nation's first territory when it joins.
    pub initial_armies: i32,
    /// Upper bound on any single holding's army size.
    pub max_armies_per_territory: i32,
    /// Unclaimed territories hold a phantom army of 1 that a move must defeat.
    #[serde(alias = "unclaimedTerritoriesHave1Army")]
    pub unclaimed_territories_have_garrison: bool,
    /// Reserved for defender counterattacks. Attacks fail while it is set.
    pub do_counterattack: bool,
    /// Write an `actions` row for every successful action.
    pub record_actions: bool,
    pub territories: Vec<Territory>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            initial_armies: DEFAULT_INITIAL_ARMIES,
            max_armies_per_territory: DEFAULT_MAX_ARMIES_PER_TERRITORY,
            unclaimed_territories_have_garrison: false,
            do_counterattack: false,
            record_actions: true,
            territories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Territory {
    #[serde(rename = "abbr")]
    pub abbreviation: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub neighbors: Vec<String>,
}

impl Territory {
    pub fn new(abbreviation: &str, name: &str, neighbors: &[&str]) -> Self {
        Self {
            abbreviation: abbreviation.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            neighbors: neighbors.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.abbreviation.eq_ignore_ascii_case(query)
            || self.name.eq_ignore_ascii_case(query)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized abbreviation, name, or alias {0:?}")]
pub struct UnknownTerritory(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("at least one territory is required")]
    NoTerritories,

    #[error("found non-unique territory with query {0:?}")]
    DuplicateTerritory(String),

    #[error("found territory {0:?} with no neighbors")]
    NoNeighbors(String),

    #[error("found territory {0:?} with itself as a neighbor")]
    SelfNeighbor(String),

    #[error("found non-mutual neighbors {0:?} and {1:?}")]
    NonMutualNeighbors(String, String),

    #[error(transparent)]
    UnknownTerritory(#[from] UnknownTerritory),

    #[error("databaseUrl is required")]
    MissingDatabaseUrl,

    #[error("failed to prepare database: {0}")]
    Database(#[from] sqlx::Error),
}

impl GameConfig {
    /// Read, default and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut config: GameConfig = serde_json::from_str(text)?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    /// A five-territory map of the US west coast, handy for tests and demos.
    pub fn west_coast() -> Self {
        Self {
            territories: vec![
                Territory::new("CA", "California", &["NV", "OR", "AZ"]),
                Territory::new("NV", "Nevada", &["CA", "OR", "UT", "AZ"]),
                Territory::new("OR", "Oregon", &["CA", "NV"]),
                Territory::new("AZ", "Arizona", &["CA", "NV", "UT"]),
                Territory::new("UT", "Utah", &["NV", "AZ"]),
            ],
            ..Self::default()
        }
    }

    /// Non-positive army settings fall back to the defaults.
    fn apply_defaults(&mut self) {
        if self.initial_armies <= 0 {
            self.initial_armies = DEFAULT_INITIAL_ARMIES;
        }
        if self.max_armies_per_territory <= 0 {
            self.max_armies_per_territory = DEFAULT_MAX_ARMIES_PER_TERRITORY;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.territories.is_empty() {
            return Err(ConfigError::NoTerritories);
        }

        let mut seen = HashSet::new();
        for territory in &self.territories {
            let keys = std::iter::once(&territory.abbreviation)
                .chain(std::iter::once(&territory.name))
                .chain(territory.aliases.iter());
            for key in keys {
                if !seen.insert(key.to_lowercase()) {
                    return Err(ConfigError::DuplicateTerritory(key.clone()));
                }
            }
        }

        for territory in &self.territories {
            if territory.neighbors.is_empty() {
                return Err(ConfigError::NoNeighbors(territory.name.clone()));
            }
            for neighbor_query in &territory.neighbors {
                let neighbor = self.resolve_territory(neighbor_query)?;
                if neighbor.abbreviation == territory.abbreviation {
                    return Err(ConfigError::SelfNeighbor(territory.abbreviation.clone()));
                }
                if !self.is_neighboring(neighbor, territory) {
                    return Err(ConfigError::NonMutualNeighbors(
                        territory.abbreviation.clone(),
                        neighbor.abbreviation.clone(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Find a territory by abbreviation, name or alias, ignoring case.
    pub fn resolve_territory(&self, query: &str) -> Result<&Territory, UnknownTerritory> {
        self.territories
            .iter()
            .find(|t| t.matches(query))
            .ok_or_else(|| UnknownTerritory(query.to_string()))
    }

    /// Whether `to` is listed among `from`'s neighbors.
    pub fn is_neighboring(&self, from: &Territory, to: &Territory) -> bool {
        from.neighbors.iter().any(|query| {
            self.resolve_territory(query)
                .is_ok_and(|n| n.abbreviation == to.abbreviation)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "territories": [
            {"abbr": "CA", "name": "California", "aliases": ["Cali"], "neighbors": ["NV"]},
            {"abbr": "NV", "name": "Nevada", "neighbors": ["CA"]}
        ]
    }"#;

    #[test]
    fn missing_numbers_take_defaults() {
        let config = GameConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.initial_armies, 3);
        assert_eq!(config.max_armies_per_territory, 5);
        assert!(!config.unclaimed_territories_have_garrison);
        assert!(config.record_actions);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn non_positive_numbers_take_defaults() {
        let json = MINIMAL.replacen('{', r#"{"initialArmies": 0, "maxArmiesPerTerritory": -2,"#, 1);
        let config = GameConfig::from_json(&json).unwrap();
        assert_eq!(config.initial_armies, 3);
        assert_eq!(config.max_armies_per_territory, 5);
    }

    #[test]
    fn legacy_garrison_key_is_accepted() {
        let json = MINIMAL.replacen('{', r#"{"unclaimedTerritoriesHave1Army": true,"#, 1);
        let config = GameConfig::from_json(&json).unwrap();
        assert!(config.unclaimed_territories_have_garrison);
    }

    #[test]
    fn resolves_by_abbreviation_name_and_alias() {
        let config = GameConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.resolve_territory("ca").unwrap().name, "California");
        assert_eq!(config.resolve_territory("NEVADA").unwrap().abbreviation, "NV");
        assert_eq!(config.resolve_territory("cali").unwrap().abbreviation, "CA");

        let err = config.resolve_territory("lol").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognized abbreviation, name, or alias \"lol\""
        );
    }

    #[test]
    fn west_coast_adjacency() {
        let config = GameConfig::west_coast();
        config.validate().unwrap();
        let az = config.resolve_territory("AZ").unwrap();
        let or = config.resolve_territory("OR").unwrap();
        let ca = config.resolve_territory("CA").unwrap();
        assert!(config.is_neighboring(az, ca));
        assert!(config.is_neighboring(ca, az));
        assert!(!config.is_neighboring(az, or));
    }

    #[test]
    fn rejects_empty_map() {
        assert!(matches!(
            GameConfig::from_json("{}"),
            Err(ConfigError::NoTerritories)
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"{"territories": [
            {"abbr": "CA", "name": "California", "neighbors": ["NV"]},
            {"abbr": "NV", "name": "california", "neighbors": ["CA"]}
        ]}"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::DuplicateTerritory(name)) if name == "california"
        ));
    }

    #[test]
    fn rejects_bad_neighbor_lists() {
        let lonely = r#"{"territories": [{"abbr": "CA", "name": "California"}]}"#;
        assert!(matches!(
            GameConfig::from_json(lonely),
            Err(ConfigError::NoNeighbors(_))
        ));

        let selfish = r#"{"territories": [
            {"abbr": "CA", "name": "California", "neighbors": ["CA"]}
        ]}"#;
        assert!(matches!(
            GameConfig::from_json(selfish),
            Err(ConfigError::SelfNeighbor(_))
        ));

        let one_way = r#"{"territories": [
            {"abbr": "CA", "name": "California", "neighbors": ["NV"]},
            {"abbr": "NV", "name": "Nevada", "neighbors": ["OR"]},
            {"abbr": "OR", "name": "Oregon", "neighbors": ["NV"]}
        ]}"#;
        assert!(matches!(
            GameConfig::from_json(one_way),
            Err(ConfigError::NonMutualNeighbors(a, b)) if a == "CA" && b == "NV"
        ));

        let dangling = r#"{"territories": [
            {"abbr": "CA", "name": "California", "neighbors": ["XX"]}
        ]}"#;
        assert!(matches!(
            GameConfig::from_json(dangling),
            Err(ConfigError::UnknownTerritory(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = GameConfig::load(file.path()).unwrap();
        assert_eq!(config.territories.len(), 2);

        let missing = file.path().with_extension("missing");
        assert!(matches!(GameConfig::load(&missing), Err(ConfigError::Io(_))));
    }
}
