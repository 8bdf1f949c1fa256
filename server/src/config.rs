//! Server configuration from the environment.
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime settings for the UDP server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the UDP socket binds to.
    pub bind: SocketAddr,
    /// Roster (species) JSON file.
    pub pokedex_path: PathBuf,
    /// Owned-pokemon JSON file.
    pub players_path: PathBuf,
    /// Seed for damage rolls; entropy when unset.
    pub seed: Option<u64>,
    /// Capacity of the outbound datagram queue.
    pub outbound_buffer: usize,
    /// Receive buffer size in bytes.
    pub max_datagram: usize,
    /// Reject commands after `@join` that carry no `~token` prefix.
    pub require_token: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            pokedex_path: PathBuf::from("data/pokedex.json"),
            players_path: PathBuf::from("data/players_pokemon.json"),
            seed: None,
            outbound_buffer: 1024,
            max_datagram: 1024,
            require_token: false,
        }
    }
}

impl ServerConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `POKEDUEL_BIND` - UDP bind address (default: 127.0.0.1:8080)
    /// - `POKEDUEL_POKEDEX` - roster file (default: data/pokedex.json)
    /// - `POKEDUEL_PLAYERS` - owned-pokemon file (default: data/players_pokemon.json)
    /// - `POKEDUEL_SEED` - damage roll seed (default: unset)
    /// - `POKEDUEL_OUTBOUND_BUFFER` - outbound queue capacity (default: 1024)
    /// - `POKEDUEL_MAX_DATAGRAM` - receive buffer size (default: 1024)
    /// - `POKEDUEL_REQUIRE_TOKEN` - `true` to require `~token` (default: false)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(bind) = read_env::<SocketAddr>("POKEDUEL_BIND") {
            config.bind = bind;
        }
        if let Some(path) = read_env::<PathBuf>("POKEDUEL_POKEDEX") {
            config.pokedex_path = path;
        }
        if let Some(path) = read_env::<PathBuf>("POKEDUEL_PLAYERS") {
            config.players_path = path;
        }
        config.seed = read_env::<u64>("POKEDUEL_SEED");
        if let Some(capacity) = read_env::<usize>("POKEDUEL_OUTBOUND_BUFFER") {
            config.outbound_buffer = capacity.max(1);
        }
        if let Some(size) = read_env::<usize>("POKEDUEL_MAX_DATAGRAM") {
            config.max_datagram = size.max(64);
        }
        if let Some(required) = read_env::<bool>("POKEDUEL_REQUIRE_TOKEN") {
            config.require_token = required;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
