//! Engine error kinds.
//!
//! The `Display` text of each variant is the status line sent back to the
//! player whose command failed.

use pokeduel_protocol::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("duplicated_username")]
    DuplicateName(String),

    #[error("Your address is already registered on the server!")]
    DuplicateEndpoint,

    #[error("You have not joined yet! Send @join <name> first.")]
    UnknownEndpoint,

    #[error("Unknown session token!")]
    InvalidToken,

    #[error("Session token required! Prefix commands with ~<token>.")]
    TokenRequired,

    #[error("You cannot battle yourself!")]
    SelfChallenge,

    #[error("Error: Opponent '{0}' did not exist in the server!")]
    UnknownOpponent(String),

    #[error("Error: Opponent '{0}' is already in a battle!")]
    OpponentBusy(String),

    #[error("You are already in a battle!")]
    SenderBusy,

    #[error("Invalid acception! No battle request from player '{0}'")]
    NoSuchInvite(String),

    #[error("Invalid pokemon selection!")]
    InvalidSelection,

    #[error("You have already picked 3 Pokemons!")]
    AlreadyPicked,

    #[error("The battle has not started yet!")]
    BattleNotStarted,

    #[error("Not your turn!")]
    NotYourTurn,

    #[error("Invalid Pokemon")]
    InvalidPokemon,

    #[error("You are not in a battle!")]
    NoActiveSession,

    #[error("Pokémon with name {0} not found")]
    UnknownPokemon(String),

    #[error("Invalid command: {0}")]
    MalformedCommand(String),
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        EngineError::MalformedCommand(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines() {
        assert_eq!(EngineError::NotYourTurn.to_string(), "Not your turn!");
        assert_eq!(
            EngineError::InvalidSelection.to_string(),
            "Invalid pokemon selection!"
        );
        assert_eq!(
            EngineError::AlreadyPicked.to_string(),
            "You have already picked 3 Pokemons!"
        );
        assert_eq!(
            EngineError::DuplicateName("Ash".into()).to_string(),
            "duplicated_username"
        );
    }

    #[test]
    fn test_from_parse_error() {
        let err: EngineError = ParseError::UnknownCommand("@dance".into()).into();
        assert_eq!(
            err,
            EngineError::MalformedCommand("unknown command '@dance'".into())
        );
        assert_eq!(err.to_string(), "Invalid command: unknown command '@dance'");
    }
}
