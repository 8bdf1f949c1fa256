//! Domain types for the battle engine

mod pokemon;
mod pokemon_type;
mod side;
mod stats;

pub use pokemon::{OwnedPokemon, SquadMember};
pub use pokemon_type::{ElementType, TYPE_CHART, TypeDefenses};
pub use side::Squad;
pub use stats::Stats;
