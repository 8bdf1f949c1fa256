//! Static species data and per-player collections

mod store;

pub use store::{Collection, PokemonStore};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use pokeduel_protocol::PokedexSummary;
use serde::Deserialize;

use crate::types::{ElementType, OwnedPokemon, Stats, TypeDefenses};

/// Species data as found under `Poke-Information`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeciesInfo {
    #[serde(default)]
    pub types: Vec<ElementType>,

    #[serde(flatten)]
    pub stats: Stats,

    #[serde(rename = "Type-Defenses", default)]
    pub type_defenses: TypeDefenses,
}

/// One species template of the roster
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Poke-Information")]
    pub info: SpeciesInfo,
}

impl RosterEntry {
    pub fn summary(&self) -> PokedexSummary {
        let stats = &self.info.stats;
        PokedexSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            types: self.info.types.iter().map(|t| t.to_string()).collect(),
            hp: stats.hp,
            atk: stats.atk,
            def: stats.def,
            sp_atk: stats.sp_atk,
            sp_def: stats.sp_def,
            speed: stats.speed,
        }
    }
}

/// Immutable table of species templates, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_id.entry(entry.id.clone()).or_insert(idx);
            by_name.entry(entry.name.to_lowercase()).or_insert(idx);
        }
        Self {
            entries,
            by_id,
            by_name,
        }
    }

    /// Load the roster from a pokedex JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse roster file {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<RosterEntry> =
            serde_json::from_str(json).context("Invalid roster JSON")?;
        Ok(Self::new(entries))
    }

    /// Find an entry by id, or by name (case-insensitive)
    pub fn find(&self, query: &str) -> Option<&RosterEntry> {
        self.by_id
            .get(query)
            .or_else(|| self.by_name.get(&query.to_lowercase()))
            .and_then(|&idx| self.entries.get(idx))
    }

    /// Defense table for an owned pokemon.
    ///
    /// Prefers the record's own table, then the species entry, then the
    /// built-in chart for the record's types.
    pub fn defenses_for(&self, owned: &OwnedPokemon) -> TypeDefenses {
        if !owned.type_defenses.is_empty() {
            return owned.type_defenses.clone();
        }

        let species = self.find(&owned.id).or_else(|| self.find(&owned.name));
        match species {
            Some(entry) if !entry.info.type_defenses.is_empty() => entry.info.type_defenses.clone(),
            Some(entry) if owned.types.is_empty() => TypeDefenses::from_chart(&entry.info.types),
            _ => TypeDefenses::from_chart(&owned.types),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
