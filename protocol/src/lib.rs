use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{ClientCommand, ClientMessage, parse_client_message};
pub use server::{PokedexSummary, ServerMessage};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("empty message")]
    EmptyMessage,
}
