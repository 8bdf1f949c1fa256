//! Per-player owned pokemon collections

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::OwnedPokemon;

/// One owner's record in the players file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Collection {
    #[serde(rename = "PlayerName")]
    pub owner: String,

    #[serde(rename = "Pokemons", default)]
    pub pokemons: Vec<OwnedPokemon>,
}

/// Owned pokemon keyed by owner name.
///
/// Experience credited after a battle lives here; squad members are copies
/// and never write back.
#[derive(Debug, Clone, Default)]
pub struct PokemonStore {
    collections: HashMap<String, Vec<OwnedPokemon>>,
}

impl PokemonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load collections from a players JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read players file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse players file {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<Collection> =
            serde_json::from_str(json).context("Invalid players JSON")?;
        Ok(Self::from_collections(records))
    }

    /// Build a store from records; a repeated owner keeps its first record
    pub fn from_collections(records: impl IntoIterator<Item = Collection>) -> Self {
        let mut collections = HashMap::new();
        for record in records {
            collections.entry(record.owner).or_insert(record.pokemons);
        }
        Self { collections }
    }

    pub fn insert(&mut self, owner: impl Into<String>, pokemons: Vec<OwnedPokemon>) {
        self.collections.insert(owner.into(), pokemons);
    }

    /// Everything `owner` owns; empty for unknown owners
    pub fn collection(&self, owner: &str) -> &[OwnedPokemon] {
        self.collections
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, owner: &str, id: &str) -> Option<&OwnedPokemon> {
        self.collection(owner).iter().find(|p| p.id == id)
    }

    /// Add `share` exp to each listed pokemon of `owner`.
    ///
    /// Returns how many records were credited.
    pub fn credit_exp(&mut self, owner: &str, ids: &[String], share: u32) -> usize {
        let Some(pokemons) = self.collections.get_mut(owner) else {
            return 0;
        };

        let mut credited = 0;
        for id in ids {
            if let Some(pokemon) = pokemons.iter_mut().find(|p| &p.id == id) {
                pokemon.exp = pokemon.exp.saturating_add(share);
                credited += 1;
            }
        }
        credited
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYERS: &str = r#"[
        {
            "PlayerName": "Ash",
            "Pokemons": [
                {"ID": "0025", "Name": "Pikachu", "Level": 10, "Exp": 100, "types": ["Electric"],
                 "HP": 35, "ATK": 55, "DEF": 40, "Sp.Atk": 50, "Sp.Def": 50, "Speed": 90},
                {"ID": "0006", "Name": "Charizard", "Level": 36, "Exp": 500, "types": ["Fire", "Flying"],
                 "HP": 78, "ATK": 84, "DEF": 78, "Sp.Atk": 109, "Sp.Def": 85, "Speed": 100}
            ]
        },
        {"PlayerName": "Misty", "Pokemons": []}
    ]"#;

    #[test]
    fn test_load_collections() {
        let store = PokemonStore::from_json_str(PLAYERS).unwrap();
        assert_eq!(store.collection("Ash").len(), 2);
        assert!(store.collection("Misty").is_empty());
        assert!(store.collection("Brock").is_empty());
        assert_eq!(store.find("Ash", "0006").unwrap().level, 36);
        assert!(store.find("Ash", "0150").is_none());
    }

    #[test]
    fn test_load_bundled_players() {
        let store = PokemonStore::load(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../data/players_pokemon.json"
        ))
        .unwrap();
        assert!(store.collection("Ash").len() >= 3);
        assert!(store.collection("Misty").len() >= 3);
    }

    #[test]
    fn test_credit_exp() {
        let mut store = PokemonStore::from_json_str(PLAYERS).unwrap();
        let ids = vec!["0025".to_string(), "0006".to_string(), "0150".to_string()];

        assert_eq!(store.credit_exp("Ash", &ids, 40), 2);
        assert_eq!(store.find("Ash", "0025").unwrap().exp, 140);
        assert_eq!(store.find("Ash", "0006").unwrap().exp, 540);

        assert_eq!(store.credit_exp("Brock", &ids, 40), 0);
    }

    #[test]
    fn test_duplicate_owner_keeps_first() {
        let store = PokemonStore::from_json_str(
            r#"[{"PlayerName": "Ash", "Pokemons": []},
                {"PlayerName": "Ash", "Pokemons": [
                    {"ID": "0001", "Name": "Bulbasaur",
                     "HP": 45, "ATK": 49, "DEF": 49, "Sp.Atk": 65, "Sp.Def": 65, "Speed": 45}]}]"#,
        )
        .unwrap();
        assert!(store.collection("Ash").is_empty());
        assert_eq!(store.owners().count(), 1);
    }
}
