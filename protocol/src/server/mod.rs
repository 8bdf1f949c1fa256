mod tests;

/// Summary of a roster entry, as shown by `@pokedex`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokedexSummary {
    pub id: String,
    pub name: String,
    pub types: Vec<String>,
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub sp_atk: u32,
    pub sp_def: u32,
    pub speed: u32,
}

/// Messages the server sends to a single client.
///
/// Each message is rendered as one datagram. Messages that clients match on
/// start with an `@` token; the rest are free-text status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Joined { name: String, token: String },
    Goodbye { name: String },

    ChallengeSent { to: String },
    ChallengeReceived { from: String },
    BattleAccepted { opponent: String },
    ChallengeDenied { by: String },
    DeniedChallenge { from: String },

    Picked,
    OpponentPicked,
    BattleStart { you_first: bool },
    ActivePokemon { name: String, hp: u32 },
    OpponentPokemon { name: String, hp: u32 },
    YourTurn,

    Hit { attacker: String, damage: u32 },
    Hurt { defender: String, damage: u32 },
    PokemonDied { name: String },
    OpponentPokemonDied { name: String },
    Changed { name: String },
    OpponentChanged { name: String, hp: u32 },

    Win,
    Lose,
    Surrendered { winner: String },
    OpponentSurrendered { loser: String },
    Abandoned { by: String },
    ExpGained { amount: u32 },

    PokemonListEntry { id: String, name: String, level: u32, hp: u32 },
    Pokedex(PokedexSummary),

    Info(String),
    Error(String),
}

impl ServerMessage {
    /// Serialize to the datagram text sent to the client
    pub fn to_wire_format(&self) -> String {
        match self {
            Self::Joined { name, token } => format!("@joined {} Welcome '{}'!", token, name),
            Self::Goodbye { name } => format!("Goodbye '{}'!", name),

            Self::ChallengeSent { to } => format!("Battle request sent to '{}'", to),
            Self::ChallengeReceived { from } => {
                format!("Player '{}' requests you a pokemon battle!", from)
            }
            Self::BattleAccepted { opponent } => {
                format!("@accepted_battle Battle with '{}' accepted! Pick 3 pokemons.", opponent)
            }
            Self::ChallengeDenied { by } => {
                format!("Your battle request to player '{}' was denied!", by)
            }
            Self::DeniedChallenge { from } => format!("You denied a battle with player '{}'", from),

            Self::Picked => "@pokemon_picked Waiting for your opponent...".to_string(),
            Self::OpponentPicked => "Your opponent has picked their pokemons.".to_string(),
            Self::BattleStart { you_first: true } => {
                "@pokemon_start_battle You attack first!".to_string()
            }
            Self::BattleStart { you_first: false } => {
                "@pokemon_start_battle Opponent will attack first!".to_string()
            }
            Self::ActivePokemon { name, hp } => format!("Active Pokemon: {} (HP: {})", name, hp),
            Self::OpponentPokemon { name, hp } => {
                format!("Opponent Pokemon: {} (HP: {})", name, hp)
            }
            Self::YourTurn => "@your_turn".to_string(),

            Self::Hit { attacker, damage } => format!("{} hits: {} damages!", attacker, damage),
            Self::Hurt { defender, damage } => format!("{} was hit: {} damages!", defender, damage),
            Self::PokemonDied { name } => {
                format!("@pokemon_died {} fainted, change your pokemon!", name)
            }
            Self::OpponentPokemonDied { name } => format!("Opponent's {} fainted!", name),
            Self::Changed { name } => format!("@changed {}", name),
            Self::OpponentChanged { name, hp } => {
                format!("Opponent changed to {} (HP: {})", name, hp)
            }

            Self::Win => "@win".to_string(),
            Self::Lose => "@lose".to_string(),
            Self::Surrendered { winner } => {
                format!("You surrendered! '{}' wins the battle!", winner)
            }
            Self::OpponentSurrendered { loser } => {
                format!("'{}' surrendered! You win the battle!", loser)
            }
            Self::Abandoned { by } => format!("Battle abandoned by '{}'", by),
            Self::ExpGained { amount } => format!("Your pokemons gained {} exp each!", amount),

            Self::PokemonListEntry {
                id,
                name,
                level,
                hp,
            } => format!(
                "@list_pokemon Pokemon ID: {}, Name: {}, Level: {}, HP: {}",
                id, name, level, hp
            ),
            Self::Pokedex(entry) => format!(
                "@pokedex ID: {}, Name: {}, Types: [{}], Base Stats: HP: {}, ATK: {}, DEF: {}, Sp.Atk: {}, Sp.Def: {}, Speed: {}",
                entry.id,
                entry.name,
                entry.types.join(", "),
                entry.hp,
                entry.atk,
                entry.def,
                entry.sp_atk,
                entry.sp_def,
                entry.speed
            ),

            Self::Info(text) | Self::Error(text) => text.clone(),
        }
    }
}
