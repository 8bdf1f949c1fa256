//! Turns one inbound datagram into the datagrams it causes.

use std::net::SocketAddr;
use std::sync::Arc;

use pokeduel_battle::{Arena, EngineError, Identity, Report, SessionToken};
use pokeduel_protocol::{ClientCommand, ClientMessage, ServerMessage, parse_client_message};
use tracing::{debug, warn};

use crate::sender::Outbound;

/// Parses commands, resolves the sender and routes into the [`Arena`]
#[derive(Clone)]
pub struct Dispatcher {
    arena: Arc<Arena>,
    require_token: bool,
}

impl Dispatcher {
    pub fn new(arena: Arc<Arena>) -> Self {
        Self {
            arena,
            require_token: false,
        }
    }

    /// When set, every command after `@join` must carry its `~token`
    pub fn with_required_token(mut self, required: bool) -> Self {
        self.require_token = required;
        self
    }

    pub fn arena(&self) -> &Arc<Arena> {
        &self.arena
    }

    /// Handle one datagram from `source`.
    ///
    /// Failures produce a single status line for `source` and nothing else.
    pub fn handle(&self, datagram: &str, source: SocketAddr) -> Vec<Outbound> {
        let message = match parse_client_message(datagram) {
            Ok(message) => message,
            Err(e) => {
                warn!(%source, error = %e, "Malformed command");
                return vec![reject(source, EngineError::from(e))];
            }
        };

        if let ClientCommand::Join(name) = &message.command {
            return match self.arena.join(name, source) {
                Ok(identity) => vec![Outbound::new(
                    source,
                    &ServerMessage::Joined {
                        name: identity.name,
                        token: identity.token.to_string(),
                    },
                )],
                Err(e) => {
                    warn!(%source, name = %name, error = %e, "Join rejected");
                    vec![reject(source, e)]
                }
            };
        }

        let identity = match self.identify(&message, source) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(%source, error = %e, "Unidentified sender");
                return vec![reject(source, e)];
            }
        };
        let player = identity.name.as_str();
        debug!(player, command = message.command.verb(), "Command received");

        match self.route(player, message.command) {
            Ok(report) => self.deliver(player, source, report),
            Err(e) => {
                warn!(player, error = %e, "Command rejected");
                vec![reject(source, e)]
            }
        }
    }

    /// The token wins when present; otherwise the source address is looked up
    /// unless tokens are required
    fn identify(&self, message: &ClientMessage, source: SocketAddr) -> Result<Identity, EngineError> {
        match &message.token {
            Some(token) => self
                .arena
                .resolve_token(&SessionToken::from(token.as_str()), source),
            None if self.require_token => Err(EngineError::TokenRequired),
            None => self.arena.resolve_endpoint(source),
        }
    }

    fn route(&self, player: &str, command: ClientCommand) -> Result<Report, EngineError> {
        match command {
            // Answered in `handle` before the sender is identified
            ClientCommand::Join(_) => Err(EngineError::DuplicateEndpoint),
            ClientCommand::Quit => self.arena.quit(player),
            ClientCommand::List => Ok(to_player(player, self.arena.list(player))),
            ClientCommand::Pokedex(query) => {
                let entry = self.arena.pokedex(&query)?;
                Ok(to_player(player, vec![entry]))
            }
            ClientCommand::Battle(opponent) => self.arena.challenge(player, &opponent),
            ClientCommand::Accept(challenger) => self.arena.accept(player, &challenger),
            ClientCommand::Deny(challenger) => self.arena.deny(player, &challenger),
            ClientCommand::Pick(ids) => self.arena.pick(player, &ids),
            ClientCommand::Attack => self.arena.attack(player),
            ClientCommand::Change(id) => self.arena.change(player, &id),
            ClientCommand::Surrender => self.arena.surrender(player),
        }
    }

    /// Address each notice. The sender is answered at the datagram's source,
    /// which also covers a player who has just quit.
    fn deliver(&self, player: &str, source: SocketAddr, report: Report) -> Vec<Outbound> {
        report
            .notices
            .into_iter()
            .filter_map(|notice| {
                let to = if notice.to == player {
                    Some(source)
                } else {
                    self.arena.endpoint_of(&notice.to)
                };
                match to {
                    Some(to) => Some(Outbound::new(to, &notice.message)),
                    None => {
                        warn!(player = %notice.to, "No endpoint for notice");
                        None
                    }
                }
            })
            .collect()
    }
}

fn to_player(player: &str, messages: Vec<ServerMessage>) -> Report {
    let mut report = Report::new();
    for message in messages {
        report.notify(player, message);
    }
    report
}

fn reject(source: SocketAddr, error: EngineError) -> Outbound {
    Outbound::new(source, &ServerMessage::Error(error.to_string()))
}
