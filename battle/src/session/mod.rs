//! A battle between two players.
//!
//! ```text
//!             pick (both)            last member fainted / surrender
//! Forming ─────────────────> Active ─────────────────────────────────> Finished
//!    │                                                                    ▲
//!    └───────────────────────── surrender (abandon) ──────────────────────┘
//! ```
//!
//! While `Active`, the turn is either `Acting(seat)` (that seat may attack or
//! change) or `MustSwap(seat)` (that seat's active member fainted and it must
//! change before anyone attacks). Every operation validates before it
//! mutates, so a rejected command leaves the session untouched.

mod outcome;

pub use outcome::{Ending, ExpAward, Notice, Report};

use std::fmt;

use pokeduel_protocol::ServerMessage;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::resolver::{DamageRoller, TurnResolver};
use crate::roster::Roster;
use crate::types::{OwnedPokemon, Squad, SquadMember};

/// Generated identifier of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of the session: P1 sent the challenge, P2 accepted it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    P1,
    P2,
}

impl Seat {
    fn index(self) -> usize {
        match self {
            Seat::P1 => 0,
            Seat::P2 => 1,
        }
    }

    pub fn opponent(self) -> Seat {
        match self {
            Seat::P1 => Seat::P2,
            Seat::P2 => Seat::P1,
        }
    }
}

/// Whose move it is while the battle is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// May attack or change
    Acting(Seat),
    /// Active member fainted; only a change is accepted
    MustSwap(Seat),
}

impl Turn {
    pub fn seat(self) -> Seat {
        match self {
            Turn::Acting(seat) | Turn::MustSwap(seat) => seat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Forming,
    Active(Turn),
    Finished { winner: Option<Seat> },
}

/// Coarse lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Forming,
    Active,
    Finished,
}

pub struct BattleSession {
    id: SessionId,
    players: [String; 2],
    squads: [Option<Squad>; 2],
    phase: Phase,
    roller: Box<dyn DamageRoller + Send>,
}

impl fmt::Debug for BattleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleSession")
            .field("id", &self.id)
            .field("players", &self.players)
            .field("squads", &self.squads)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl BattleSession {
    /// Create a forming session between `challenger` (P1) and `accepter` (P2)
    pub fn new(
        id: SessionId,
        challenger: impl Into<String>,
        accepter: impl Into<String>,
        roller: Box<dyn DamageRoller + Send>,
    ) -> Self {
        Self {
            id,
            players: [challenger.into(), accepter.into()],
            squads: [None, None],
            phase: Phase::Forming,
            roller,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn players(&self) -> [&str; 2] {
        [&self.players[0], &self.players[1]]
    }

    pub fn player(&self, seat: Seat) -> &str {
        &self.players[seat.index()]
    }

    pub fn seat_of(&self, name: &str) -> Option<Seat> {
        [Seat::P1, Seat::P2]
            .into_iter()
            .find(|seat| self.players[seat.index()] == name)
    }

    pub fn opponent_of(&self, name: &str) -> Option<&str> {
        self.seat_of(name).map(|seat| self.player(seat.opponent()))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::Forming => SessionStatus::Forming,
            Phase::Active(_) => SessionStatus::Active,
            Phase::Finished { .. } => SessionStatus::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    /// The player allowed to act next, while active
    pub fn turn_holder(&self) -> Option<&str> {
        match self.phase {
            Phase::Active(turn) => Some(self.player(turn.seat())),
            _ => None,
        }
    }

    /// Winner of a finished session (None when abandoned)
    pub fn winner(&self) -> Option<&str> {
        match self.phase {
            Phase::Finished {
                winner: Some(seat),
            } => Some(self.player(seat)),
            _ => None,
        }
    }

    pub fn squad(&self, seat: Seat) -> Option<&Squad> {
        self.squads[seat.index()].as_ref()
    }

    pub fn squad_of(&self, name: &str) -> Option<&Squad> {
        self.seat_of(name).and_then(|seat| self.squad(seat))
    }

    fn active(&self, seat: Seat) -> Option<&SquadMember> {
        self.squad(seat).and_then(Squad::active)
    }

    /// Seat of a participant in a session that is still running
    fn seat_for(&self, player: &str) -> Result<Seat, EngineError> {
        if self.is_finished() {
            return Err(EngineError::NoActiveSession);
        }
        self.seat_of(player).ok_or(EngineError::NoActiveSession)
    }

    /// Commit `player`'s squad from their owned collection.
    ///
    /// The ids must be three distinct entries of `owned`; anything else is
    /// rejected without storing a partial squad. The second successful pick
    /// starts the battle.
    pub fn pick(
        &mut self,
        player: &str,
        ids: &[String],
        owned: &[OwnedPokemon],
        roster: &Roster,
    ) -> Result<Report, EngineError> {
        let seat = self.seat_for(player)?;
        if self.phase != Phase::Forming || self.squads[seat.index()].is_some() {
            return Err(EngineError::AlreadyPicked);
        }

        let members = Self::materialize(ids, owned, roster)?;
        self.squads[seat.index()] = Some(Squad::new(members));
        debug!(session = %self.id, player, ids = ?ids, "Squad picked");

        let mut report = Report::new();
        let opponent = seat.opponent();
        if self.squads[opponent.index()].is_none() {
            report.notify(player, ServerMessage::Picked);
            report.notify(self.player(opponent), ServerMessage::OpponentPicked);
        } else {
            self.start(&mut report);
        }
        Ok(report)
    }

    fn materialize(
        ids: &[String],
        owned: &[OwnedPokemon],
        roster: &Roster,
    ) -> Result<Vec<SquadMember>, EngineError> {
        if ids.len() != Squad::SIZE {
            return Err(EngineError::InvalidSelection);
        }

        let mut members = Vec::with_capacity(Squad::SIZE);
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(EngineError::InvalidSelection);
            }
            let record = owned
                .iter()
                .find(|pokemon| &pokemon.id == id)
                .filter(|pokemon| pokemon.stats.hp > 0)
                .ok_or(EngineError::InvalidSelection)?;
            members.push(SquadMember::from_owned(record, roster.defenses_for(record)));
        }
        Ok(members)
    }

    /// Both squads are in: faster lead acts first, the accepter wins ties
    fn start(&mut self, report: &mut Report) {
        let speed = |seat: Seat| self.active(seat).map_or(0, |member| member.speed);
        let first = if speed(Seat::P1) > speed(Seat::P2) {
            Seat::P1
        } else {
            Seat::P2
        };
        self.phase = Phase::Active(Turn::Acting(first));

        for seat in [Seat::P1, Seat::P2] {
            let name = self.player(seat);
            report.notify(
                name,
                ServerMessage::BattleStart {
                    you_first: seat == first,
                },
            );
            if let Some(own) = self.active(seat) {
                report.notify(
                    name,
                    ServerMessage::ActivePokemon {
                        name: own.name.clone(),
                        hp: own.current_hp,
                    },
                );
            }
            if let Some(theirs) = self.active(seat.opponent()) {
                report.notify(
                    name,
                    ServerMessage::OpponentPokemon {
                        name: theirs.name.clone(),
                        hp: theirs.current_hp,
                    },
                );
            }
        }
        report.notify(self.player(first), ServerMessage::YourTurn);

        info!(session = %self.id, first = self.player(first), "Battle started");
    }

    /// Hit the opponent's active member with `player`'s active member
    pub fn attack(&mut self, player: &str) -> Result<Report, EngineError> {
        let seat = self.seat_for(player)?;
        match self.phase {
            Phase::Forming => return Err(EngineError::BattleNotStarted),
            Phase::Active(Turn::Acting(acting)) if acting == seat => {}
            _ => return Err(EngineError::NotYourTurn),
        }
        let target = seat.opponent();

        let (attacker, defender) = match (
            self.squads[seat.index()].as_ref().and_then(Squad::active),
            self.squads[target.index()].as_ref().and_then(Squad::active),
        ) {
            (Some(attacker), Some(defender)) => (attacker, defender),
            _ => return Err(EngineError::BattleNotStarted),
        };
        let damage = TurnResolver::resolve_attack(attacker, defender, &mut *self.roller);
        let attacker_name = attacker.name.clone();
        let attacker_hp = attacker.current_hp;

        let Some(squad) = self.squads[target.index()].as_mut() else {
            return Err(EngineError::BattleNotStarted);
        };
        let Some(defender) = squad.active_mut() else {
            return Err(EngineError::BattleNotStarted);
        };
        let remaining = defender.take_damage(damage.amount);
        let defender_name = defender.name.clone();
        let fainted = defender.is_fainted();
        let has_bench = squad.alive_count() > 0;

        debug!(
            session = %self.id,
            attacker = player,
            kind = %damage.kind,
            damage = damage.amount,
            remaining,
            "Attack resolved"
        );

        let attacker_player = self.player(seat).to_string();
        let defender_player = self.player(target).to_string();
        let mut report = Report::new();

        report.notify(
            &attacker_player,
            ServerMessage::Hit {
                attacker: attacker_name.clone(),
                damage: damage.amount,
            },
        );
        report.notify(
            &attacker_player,
            ServerMessage::ActivePokemon {
                name: attacker_name,
                hp: attacker_hp,
            },
        );
        report.notify(
            &attacker_player,
            ServerMessage::OpponentPokemon {
                name: defender_name.clone(),
                hp: remaining,
            },
        );
        report.notify(
            &defender_player,
            ServerMessage::Hurt {
                defender: defender_name.clone(),
                damage: damage.amount,
            },
        );
        report.notify(
            &defender_player,
            ServerMessage::ActivePokemon {
                name: defender_name.clone(),
                hp: remaining,
            },
        );

        if !fainted {
            self.phase = Phase::Active(Turn::Acting(target));
            report.notify(&defender_player, ServerMessage::YourTurn);
        } else if has_bench {
            self.phase = Phase::Active(Turn::MustSwap(target));
            report.notify(
                &attacker_player,
                ServerMessage::OpponentPokemonDied {
                    name: defender_name.clone(),
                },
            );
            report.notify(
                &defender_player,
                ServerMessage::PokemonDied {
                    name: defender_name,
                },
            );
        } else {
            self.phase = Phase::Finished {
                winner: Some(seat),
            };
            report.notify(
                &attacker_player,
                ServerMessage::OpponentPokemonDied {
                    name: defender_name,
                },
            );
            report.notify(&attacker_player, ServerMessage::Win);
            report.notify(&defender_player, ServerMessage::Lose);
            report.ending = Some(Ending::Victory {
                winner: attacker_player.clone(),
                loser: defender_player.clone(),
                award: None,
            });
            info!(session = %self.id, winner = %attacker_player, "Battle won");
        }

        Ok(report)
    }

    /// Make squad member `id` active; consumes the turn
    pub fn change(&mut self, player: &str, id: &str) -> Result<Report, EngineError> {
        let seat = self.seat_for(player)?;
        match self.phase {
            Phase::Forming => return Err(EngineError::BattleNotStarted),
            Phase::Active(turn) if turn.seat() == seat => {}
            _ => return Err(EngineError::NotYourTurn),
        }

        let squad = self.squads[seat.index()]
            .as_mut()
            .ok_or(EngineError::InvalidPokemon)?;
        let index = squad
            .find(id)
            .filter(|&index| {
                squad
                    .members()
                    .get(index)
                    .is_some_and(|member| !member.is_fainted())
            })
            .ok_or(EngineError::InvalidPokemon)?;
        squad.set_active(index);

        let Some(member) = squad.active() else {
            return Err(EngineError::InvalidPokemon);
        };
        let (name, hp) = (member.name.clone(), member.current_hp);

        let opponent = seat.opponent();
        self.phase = Phase::Active(Turn::Acting(opponent));
        debug!(session = %self.id, player, pokemon = %name, "Changed active pokemon");

        let mut report = Report::new();
        report.notify(player, ServerMessage::Changed { name: name.clone() });
        report.notify(
            self.player(opponent),
            ServerMessage::OpponentChanged { name, hp },
        );
        report.notify(self.player(opponent), ServerMessage::YourTurn);
        Ok(report)
    }

    /// Give up. Before the battle starts this abandons the session; after,
    /// the opponent wins and is owed a third of the surrendering squad's exp.
    pub fn surrender(&mut self, player: &str) -> Result<Report, EngineError> {
        let seat = self.seat_for(player)?;
        let winner = seat.opponent();
        let winner_name = self.player(winner).to_string();
        let mut report = Report::new();

        match self.phase {
            Phase::Forming => {
                self.phase = Phase::Finished { winner: None };
                for name in [player, winner_name.as_str()] {
                    report.notify(
                        name,
                        ServerMessage::Abandoned {
                            by: player.to_string(),
                        },
                    );
                }
                report.ending = Some(Ending::Abandoned {
                    by: player.to_string(),
                });
                info!(session = %self.id, player, "Battle abandoned");
            }
            Phase::Active(_) => {
                let share = self.squad(seat).map_or(0, Squad::total_exp) / 3;
                let pokemon_ids = self.squad(winner).map(Squad::ids).unwrap_or_default();
                self.phase = Phase::Finished {
                    winner: Some(winner),
                };

                report.notify(
                    player,
                    ServerMessage::Surrendered {
                        winner: winner_name.clone(),
                    },
                );
                report.notify(player, ServerMessage::Lose);
                report.notify(
                    &winner_name,
                    ServerMessage::OpponentSurrendered {
                        loser: player.to_string(),
                    },
                );
                report.notify(&winner_name, ServerMessage::Win);
                report.notify(&winner_name, ServerMessage::ExpGained { amount: share });
                report.ending = Some(Ending::Victory {
                    winner: winner_name.clone(),
                    loser: player.to_string(),
                    award: Some(ExpAward {
                        recipient: winner_name.clone(),
                        pokemon_ids,
                        share,
                    }),
                });
                info!(session = %self.id, player, winner = %winner_name, share, "Battle surrendered");
            }
            Phase::Finished { .. } => return Err(EngineError::NoActiveSession),
        }

        Ok(report)
    }
}
