//! Battle session engine for pokeduel.
//!
//! This crate owns everything between a parsed command and the messages it
//! produces: who is connected, who challenged whom, and the turn-based state
//! of every running battle.
//!
//! # Overview
//!
//! ```text
//! pokeduel-protocol (wire format)
//!        │
//!        ▼
//! pokeduel-battle (engine) ← THIS CRATE
//!   Arena
//!     ├─> IdentityDirectory  names, tokens, reply endpoints
//!     ├─> InviteBroker       pending challenges
//!     ├─> SessionRegistry    one BattleSession per pair of players
//!     │     └─> TurnResolver damage math
//!     └─> Roster / PokemonStore  species and owned pokemon
//!        │
//!        ▼
//! pokeduel-server (UDP front end)
//! ```
//!
//! # Main Types
//!
//! - [`Arena`] - shared state and lock discipline; the entry point for callers
//! - [`BattleSession`] - the `Forming → Active → Finished` state machine
//! - [`TurnResolver`] - physical/special damage with an injectable [`DamageRoller`]
//! - [`IdentityDirectory`] - name ↔ token ↔ endpoint lookups
//! - [`InviteBroker`] - directed set of pending challenges
//! - [`Roster`], [`PokemonStore`] - data loaded at startup
//!
//! # Example Usage
//!
//! ```ignore
//! use pokeduel_battle::{Arena, PokemonStore, Roster};
//!
//! let arena = Arena::new(Roster::load("data/pokedex.json")?, PokemonStore::load("data/players_pokemon.json")?);
//! arena.join("Ash", "127.0.0.1:5000".parse()?)?;
//! arena.join("Misty", "127.0.0.1:5001".parse()?)?;
//! arena.challenge("Ash", "Misty")?;
//! arena.accept("Misty", "Ash")?;
//!
//! let report = arena.attack("Ash")?;
//! for notice in &report.notices {
//!     println!("{} <- {}", notice.to, notice.message.to_wire_format());
//! }
//! ```

pub mod arena;
pub mod directory;
pub mod error;
pub mod invite;
pub mod resolver;
pub mod roster;
pub mod session;
pub mod types;

// Engine surface used by the server crate
pub use arena::{Arena, RollerFactory, SessionRegistry, SharedSession};
pub use directory::{Identity, IdentityDirectory, SessionToken};
pub use error::EngineError;
pub use invite::{InviteBroker, InviteRequest, Presence};
pub use resolver::{AttackKind, Damage, DamageRoller, FixedRoller, RandomRoller, TurnResolver};
pub use roster::{Collection, PokemonStore, Roster, RosterEntry, SpeciesInfo};
pub use session::{
    BattleSession, Ending, ExpAward, Notice, Phase, Report, Seat, SessionId, SessionStatus, Turn,
};
pub use types::{ElementType, OwnedPokemon, Squad, SquadMember, Stats, TYPE_CHART, TypeDefenses};

// Notices carry protocol messages
pub use pokeduel_protocol::ServerMessage;
