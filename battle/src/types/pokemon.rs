//! Owned pokemon records and their in-battle copies

use serde::Deserialize;

use super::pokemon_type::{ElementType, TypeDefenses};
use super::stats::Stats;

/// A pokemon in a player's persistent collection.
///
/// `exp` is the only field that changes at runtime (credited when an
/// opponent surrenders).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwnedPokemon {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Level", default = "default_level")]
    pub level: u32,

    #[serde(rename = "Exp", default)]
    pub exp: u32,

    #[serde(rename = "types", default)]
    pub types: Vec<ElementType>,

    #[serde(flatten)]
    pub stats: Stats,

    #[serde(rename = "Type-Defenses", default)]
    pub type_defenses: TypeDefenses,
}

fn default_level() -> u32 {
    1
}

impl OwnedPokemon {
    pub fn new(id: impl Into<String>, name: impl Into<String>, stats: Stats) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: default_level(),
            exp: 0,
            types: Vec::new(),
            stats,
            type_defenses: TypeDefenses::new(),
        }
    }

    pub fn with_types(mut self, types: Vec<ElementType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_exp(mut self, exp: u32) -> Self {
        self.exp = exp;
        self
    }
}

/// A squad member: the battle-local copy of an owned pokemon.
///
/// Only `current_hp` changes during a battle; the other stats stay fixed for
/// the lifetime of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadMember {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub exp: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    pub def: u32,
    pub sp_atk: u32,
    pub sp_def: u32,
    pub speed: u32,
    pub types: Vec<ElementType>,
    pub type_defenses: TypeDefenses,
}

impl SquadMember {
    /// Materialize a squad member at full HP.
    ///
    /// Owned records already carry level-adjusted stats, so HP is not rescaled.
    pub fn from_owned(owned: &OwnedPokemon, type_defenses: TypeDefenses) -> Self {
        Self {
            id: owned.id.clone(),
            name: owned.name.clone(),
            level: owned.level,
            exp: owned.exp,
            current_hp: owned.stats.hp,
            max_hp: owned.stats.hp,
            atk: owned.stats.atk,
            def: owned.stats.def,
            sp_atk: owned.stats.sp_atk,
            sp_def: owned.stats.sp_def,
            speed: owned.stats.speed,
            types: owned.types.clone(),
            type_defenses,
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Subtract damage, flooring at 0. Returns the remaining HP.
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        self.current_hp = self.current_hp.saturating_sub(damage);
        self.current_hp
    }
}
