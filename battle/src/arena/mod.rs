//! Process-wide battle state shared by every request handler.
//!
//! Lock order, outermost first: directory, invites, session, store,
//! registry. Any prefix may be skipped. The registry lock is never held
//! while locking a session.

mod registry;

pub use registry::{SessionRegistry, SharedSession};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pokeduel_protocol::ServerMessage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::directory::{Identity, IdentityDirectory, SessionToken};
use crate::error::EngineError;
use crate::invite::{InviteBroker, Presence};
use crate::resolver::{DamageRoller, RandomRoller};
use crate::roster::{PokemonStore, Roster};
use crate::session::{BattleSession, Report, SessionId, SessionStatus};
use crate::types::OwnedPokemon;

/// Builds the damage roller for a new session
pub type RollerFactory = Box<dyn Fn(SessionId) -> Box<dyn DamageRoller + Send> + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(rwlock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rwlock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rwlock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}

fn entropy_roller(_: SessionId) -> Box<dyn DamageRoller + Send> {
    Box::new(RandomRoller::new(StdRng::from_entropy()))
}

/// Presence as seen through the directory and the live sessions
struct Lobby<'a> {
    directory: &'a IdentityDirectory,
    registry: &'a SessionRegistry,
}

impl Presence for Lobby<'_> {
    fn is_registered(&self, name: &str) -> bool {
        self.directory.contains(name)
    }

    fn is_busy(&self, name: &str) -> bool {
        self.registry.contains_player(name)
    }
}

pub struct Arena {
    roster: Roster,
    store: RwLock<PokemonStore>,
    directory: Mutex<IdentityDirectory>,
    invites: Mutex<InviteBroker>,
    registry: RwLock<SessionRegistry>,
    next_session: AtomicU64,
    rollers: RollerFactory,
}

impl Arena {
    /// Arena whose sessions roll damage from OS entropy
    pub fn new(roster: Roster, store: PokemonStore) -> Self {
        Self {
            roster,
            store: RwLock::new(store),
            directory: Mutex::new(IdentityDirectory::new()),
            invites: Mutex::new(InviteBroker::new()),
            registry: RwLock::new(SessionRegistry::new()),
            next_session: AtomicU64::new(1),
            rollers: Box::new(entropy_roller),
        }
    }

    /// Seed every session's roller from `seed` and the session id
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_roller_factory(move |id| {
            Box::new(RandomRoller::new(StdRng::seed_from_u64(
                seed.wrapping_add(id.0),
            )))
        })
    }

    pub fn with_roller_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(SessionId) -> Box<dyn DamageRoller + Send> + Send + Sync + 'static,
    {
        self.rollers = Box::new(factory);
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    // Identities

    pub fn join(&self, name: &str, endpoint: SocketAddr) -> Result<Identity, EngineError> {
        let identity = lock(&self.directory).register(name, endpoint)?;
        info!(player = %identity.name, %endpoint, "Player joined");
        Ok(identity)
    }

    pub fn resolve_endpoint(&self, endpoint: SocketAddr) -> Result<Identity, EngineError> {
        lock(&self.directory).resolve(endpoint)
    }

    pub fn resolve_token(
        &self,
        token: &SessionToken,
        endpoint: SocketAddr,
    ) -> Result<Identity, EngineError> {
        lock(&self.directory).resolve_token(token, endpoint)
    }

    pub fn endpoint_of(&self, name: &str) -> Option<SocketAddr> {
        lock(&self.directory).endpoint_of(name)
    }

    /// Leave the server. A running battle counts as a surrender, a forming
    /// one is abandoned, and pending invites are dropped.
    ///
    /// The directory and invite locks are held throughout, so no `accept`
    /// can seat the player in a new session while they are leaving.
    pub fn quit(&self, player: &str) -> Result<Report, EngineError> {
        let mut directory = lock(&self.directory);
        let mut invites = lock(&self.invites);
        if !directory.contains(player) {
            return Err(EngineError::UnknownEndpoint);
        }
        invites.drop_player(player);

        let mut report = match self.session_of(player) {
            Some(shared) => {
                let mut session = lock(&shared);
                match session.surrender(player) {
                    Ok(report) => {
                        self.settle(&session, &report);
                        report
                    }
                    Err(EngineError::NoActiveSession) => Report::new(),
                    Err(e) => return Err(e),
                }
            }
            None => Report::new(),
        };
        directory.unregister(player);

        report.notify(
            player,
            ServerMessage::Goodbye {
                name: player.to_string(),
            },
        );
        info!(player, "Player quit");
        Ok(report)
    }

    // Invites

    pub fn challenge(&self, from: &str, to: &str) -> Result<Report, EngineError> {
        let directory = lock(&self.directory);
        let mut invites = lock(&self.invites);
        let registry = read(&self.registry);
        let lobby = Lobby {
            directory: &directory,
            registry: &registry,
        };
        invites.challenge(from, to, &lobby)?;

        let mut report = Report::new();
        report.notify(from, ServerMessage::ChallengeSent { to: to.to_string() });
        report.notify(
            to,
            ServerMessage::ChallengeReceived {
                from: from.to_string(),
            },
        );
        Ok(report)
    }

    /// `accepter` takes `challenger`'s request; creates a forming session
    pub fn accept(&self, accepter: &str, challenger: &str) -> Result<Report, EngineError> {
        let directory = lock(&self.directory);
        let mut invites = lock(&self.invites);
        let mut registry = write(&self.registry);
        {
            let lobby = Lobby {
                directory: &directory,
                registry: &registry,
            };
            invites.accept(accepter, challenger, &lobby)?;
        }

        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let roller = (self.rollers)(id);
        registry.insert(BattleSession::new(id, challenger, accepter, roller));
        info!(session = %id, challenger, accepter, "Session created");

        let mut report = Report::new();
        report.notify(
            challenger,
            ServerMessage::BattleAccepted {
                opponent: accepter.to_string(),
            },
        );
        report.notify(
            accepter,
            ServerMessage::BattleAccepted {
                opponent: challenger.to_string(),
            },
        );
        Ok(report)
    }

    pub fn deny(&self, denier: &str, challenger: &str) -> Result<Report, EngineError> {
        lock(&self.invites).deny(denier, challenger)?;

        let mut report = Report::new();
        report.notify(
            denier,
            ServerMessage::DeniedChallenge {
                from: challenger.to_string(),
            },
        );
        report.notify(
            challenger,
            ServerMessage::ChallengeDenied {
                by: denier.to_string(),
            },
        );
        Ok(report)
    }

    // Battle

    pub fn pick(&self, player: &str, ids: &[String]) -> Result<Report, EngineError> {
        let shared = self.session_of(player).ok_or(EngineError::NoActiveSession)?;
        let mut session = lock(&shared);
        let store = read(&self.store);
        session.pick(player, ids, store.collection(player), &self.roster)
    }

    pub fn attack(&self, player: &str) -> Result<Report, EngineError> {
        self.with_session(player, |session| session.attack(player))
    }

    pub fn change(&self, player: &str, id: &str) -> Result<Report, EngineError> {
        self.with_session(player, |session| session.change(player, id))
    }

    pub fn surrender(&self, player: &str) -> Result<Report, EngineError> {
        self.with_session(player, |session| session.surrender(player))
    }

    /// Run `op` under the player's session lock and settle the outcome
    fn with_session<F>(&self, player: &str, op: F) -> Result<Report, EngineError>
    where
        F: FnOnce(&mut BattleSession) -> Result<Report, EngineError>,
    {
        let shared = self.session_of(player).ok_or(EngineError::NoActiveSession)?;
        let mut session = lock(&shared);
        let report = op(&mut *session)?;
        self.settle(&session, &report);
        Ok(report)
    }

    /// Credit experience and retire the session if `report` finished it.
    ///
    /// Called with the session lock held; a finished session rejects every
    /// later operation, so this runs at most once per session.
    fn settle(&self, session: &BattleSession, report: &Report) {
        let Some(ending) = &report.ending else {
            return;
        };

        if let Some(award) = ending.award() {
            let credited =
                write(&self.store).credit_exp(&award.recipient, &award.pokemon_ids, award.share);
            info!(
                session = %session.id(),
                player = %award.recipient,
                share = award.share,
                credited,
                "Experience awarded"
            );
        }

        write(&self.registry).remove(session.id());
        info!(session = %session.id(), winner = ?ending.winner(), "Session closed");
    }

    // Queries

    /// `@list_pokemon` lines for everything `player` owns
    pub fn list(&self, player: &str) -> Vec<ServerMessage> {
        let store = read(&self.store);
        let owned = store.collection(player);
        if owned.is_empty() {
            return vec![ServerMessage::Info("You have no pokemons!".to_string())];
        }
        owned
            .iter()
            .map(|pokemon| ServerMessage::PokemonListEntry {
                id: pokemon.id.clone(),
                name: pokemon.name.clone(),
                level: pokemon.level,
                hp: pokemon.stats.hp,
            })
            .collect()
    }

    pub fn pokedex(&self, query: &str) -> Result<ServerMessage, EngineError> {
        self.roster
            .find(query)
            .map(|entry| ServerMessage::Pokedex(entry.summary()))
            .ok_or_else(|| EngineError::UnknownPokemon(query.to_string()))
    }

    pub fn collection(&self, player: &str) -> Vec<OwnedPokemon> {
        read(&self.store).collection(player).to_vec()
    }

    pub fn session_of(&self, player: &str) -> Option<SharedSession> {
        read(&self.registry).session_of(player)
    }

    pub fn is_busy(&self, player: &str) -> bool {
        read(&self.registry).contains_player(player)
    }

    pub fn session_status(&self, player: &str) -> Option<SessionStatus> {
        let shared = self.session_of(player)?;
        let session = lock(&shared);
        Some(session.status())
    }

    pub fn turn_holder(&self, player: &str) -> Option<String> {
        let shared = self.session_of(player)?;
        let session = lock(&shared);
        session.turn_holder().map(str::to_string)
    }

    pub fn live_sessions(&self) -> usize {
        read(&self.registry).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resolver::{AttackKind, FixedRoller};
    use crate::roster::Collection;
    use crate::types::Stats;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn mon(id: &str, name: &str, hp: u32, speed: u32, exp: u32) -> OwnedPokemon {
        OwnedPokemon::new(id, name, Stats::new(hp, 50, 30, 10, 10, speed)).with_exp(exp)
    }

    fn arena() -> Arena {
        let store = PokemonStore::from_collections([
            Collection {
                owner: "Ash".into(),
                pokemons: vec![
                    mon("0025", "Pikachu", 100, 90, 10),
                    mon("0006", "Charizard", 100, 80, 20),
                    mon("0001", "Bulbasaur", 100, 45, 30),
                ],
            },
            Collection {
                owner: "Misty".into(),
                pokemons: vec![
                    mon("0120", "Staryu", 100, 40, 60),
                    mon("0121", "Starmie", 100, 40, 60),
                    mon("0054", "Psyduck", 100, 40, 63),
                ],
            },
        ]);
        Arena::new(Roster::default(), store)
            .with_roller_factory(|_| Box::new(FixedRoller(AttackKind::Physical)))
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Ash and Misty joined, challenged, accepted and picked
    fn battling() -> Arena {
        let arena = arena();
        arena.join("Ash", addr(5000)).unwrap();
        arena.join("Misty", addr(5001)).unwrap();
        arena.challenge("Ash", "Misty").unwrap();
        arena.accept("Misty", "Ash").unwrap();
        arena.pick("Ash", &ids(&["0025", "0006", "0001"])).unwrap();
        arena.pick("Misty", &ids(&["0120", "0121", "0054"])).unwrap();
        arena
    }

    #[test]
    fn test_accept_creates_forming_session() {
        let arena = arena();
        arena.join("Ash", addr(5000)).unwrap();
        arena.join("Misty", addr(5001)).unwrap();

        let report = arena.challenge("Ash", "Misty").unwrap();
        assert!(report.messages_for("Misty").any(|m| *m
            == ServerMessage::ChallengeReceived {
                from: "Ash".into()
            }));
        assert!(!arena.is_busy("Ash"));

        arena.accept("Misty", "Ash").unwrap();
        assert_eq!(arena.session_status("Ash"), Some(SessionStatus::Forming));
        assert_eq!(arena.session_status("Misty"), Some(SessionStatus::Forming));
        assert!(arena.is_busy("Ash") && arena.is_busy("Misty"));
        assert_eq!(arena.live_sessions(), 1);
    }

    #[test]
    fn test_busy_players_cannot_be_challenged() {
        let arena = battling();
        arena.join("Brock", addr(5002)).unwrap();

        assert_eq!(
            arena.challenge("Brock", "Ash"),
            Err(EngineError::OpponentBusy("Ash".into()))
        );
        assert_eq!(arena.challenge("Ash", "Brock"), Err(EngineError::SenderBusy));
        assert_eq!(
            arena.challenge("Brock", "Gary"),
            Err(EngineError::UnknownOpponent("Gary".into()))
        );
    }

    #[test]
    fn test_accept_after_opponent_got_busy() {
        let arena = arena();
        for (i, name) in ["Ash", "Misty", "Brock"].into_iter().enumerate() {
            arena.join(name, addr(5000 + i as u16)).unwrap();
        }
        arena.challenge("Ash", "Misty").unwrap();
        arena.challenge("Ash", "Brock").unwrap();
        arena.accept("Misty", "Ash").unwrap();

        assert_eq!(
            arena.accept("Brock", "Ash"),
            Err(EngineError::OpponentBusy("Ash".into()))
        );
        assert_eq!(arena.live_sessions(), 1);
    }

    #[test]
    fn test_battle_flow_to_victory() {
        let arena = battling();
        assert_eq!(arena.session_status("Ash"), Some(SessionStatus::Active));
        assert_eq!(arena.turn_holder("Misty").as_deref(), Some("Ash"));

        // 20 damage per hit against 100 HP. Misty only changes, re-selecting
        // her active member to pass the turn and swapping after each faint.
        let order = ["0120", "0121", "0054"];
        let mut current = 0;
        let mut finished = None;
        for _ in 0..20 {
            let report = arena.attack("Ash").unwrap();
            if report.is_finished() {
                finished = Some(report);
                break;
            }
            let fainted = report
                .messages_for("Misty")
                .any(|m| matches!(m, ServerMessage::PokemonDied { .. }));
            if fainted {
                assert_eq!(arena.attack("Ash"), Err(EngineError::NotYourTurn));
                current += 1;
            }
            arena.change("Misty", order[current]).unwrap();
        }

        let report = finished.expect("battle should finish");
        assert!(report.messages_for("Ash").any(|m| *m == ServerMessage::Win));
        assert!(report.messages_for("Misty").any(|m| *m == ServerMessage::Lose));
        assert!(!arena.is_busy("Ash"));
        assert!(!arena.is_busy("Misty"));
        assert_eq!(arena.live_sessions(), 0);
        assert_eq!(arena.attack("Ash"), Err(EngineError::NoActiveSession));
    }

    #[test]
    fn test_surrender_credits_store_once() {
        let arena = battling();
        arena.surrender("Misty").unwrap();

        // (60 + 60 + 63) / 3 = 61
        let exp: Vec<u32> = arena.collection("Ash").iter().map(|p| p.exp).collect();
        assert_eq!(exp, vec![71, 81, 91]);
        assert!(!arena.is_busy("Ash"));

        assert_eq!(arena.surrender("Misty"), Err(EngineError::NoActiveSession));
        assert_eq!(arena.surrender("Ash"), Err(EngineError::NoActiveSession));
        let exp: Vec<u32> = arena.collection("Ash").iter().map(|p| p.exp).collect();
        assert_eq!(exp, vec![71, 81, 91]);
    }

    #[test]
    fn test_quit_mid_battle_surrenders() {
        let arena = battling();
        let report = arena.quit("Ash").unwrap();

        assert!(report.messages_for("Misty").any(|m| *m == ServerMessage::Win));
        assert!(report.messages_for("Ash").any(|m| *m
            == ServerMessage::Goodbye {
                name: "Ash".into()
            }));
        assert_eq!(arena.resolve_endpoint(addr(5000)), Err(EngineError::UnknownEndpoint));
        assert!(!arena.is_busy("Misty"));

        // (10 + 20 + 30) / 3 = 20
        let exp: Vec<u32> = arena.collection("Misty").iter().map(|p| p.exp).collect();
        assert_eq!(exp, vec![80, 80, 83]);
    }

    #[test]
    fn test_quit_drops_invites_and_forming_session() {
        let arena = arena();
        arena.join("Ash", addr(5000)).unwrap();
        arena.join("Misty", addr(5001)).unwrap();
        arena.join("Brock", addr(5002)).unwrap();
        arena.challenge("Brock", "Ash").unwrap();
        arena.challenge("Ash", "Misty").unwrap();
        arena.accept("Misty", "Ash").unwrap();

        let report = arena.quit("Ash").unwrap();
        assert!(report.messages_for("Misty").any(|m| *m
            == ServerMessage::Abandoned {
                by: "Ash".into()
            }));
        assert_eq!(arena.live_sessions(), 0);
        assert_eq!(
            arena.accept("Misty", "Ash"),
            Err(EngineError::NoSuchInvite("Ash".into()))
        );

        // Name can be taken again
        arena.join("Ash", addr(5003)).unwrap();
        assert_eq!(
            arena.accept("Ash", "Brock"),
            Err(EngineError::NoSuchInvite("Brock".into()))
        );
    }

    #[test]
    fn test_accept_after_challenger_quit() {
        let arena = arena();
        arena.join("Ash", addr(5000)).unwrap();
        arena.join("Misty", addr(5001)).unwrap();
        arena.challenge("Ash", "Misty").unwrap();

        arena.quit("Ash").unwrap();
        assert_eq!(
            arena.accept("Misty", "Ash"),
            Err(EngineError::NoSuchInvite("Ash".into()))
        );
        assert!(!arena.is_busy("Ash"));
        assert!(!arena.is_busy("Misty"));
        assert_eq!(arena.live_sessions(), 0);
        assert_eq!(arena.quit("Ash"), Err(EngineError::UnknownEndpoint));
    }

    #[test]
    fn test_quit_racing_accept_never_seats_departed_player() {
        for _ in 0..200 {
            let arena = arena();
            arena.join("Ash", addr(5000)).unwrap();
            arena.join("Misty", addr(5001)).unwrap();
            arena.challenge("Ash", "Misty").unwrap();

            std::thread::scope(|s| {
                s.spawn(|| arena.quit("Ash"));
                s.spawn(|| arena.accept("Misty", "Ash"));
            });

            // Either quit abandoned the accepted session or accept found no invite
            assert_eq!(arena.live_sessions(), 0);
            assert!(!arena.is_busy("Ash"));
            assert!(!arena.is_busy("Misty"));
            assert_eq!(arena.endpoint_of("Ash"), None);
        }
    }

    #[test]
    fn test_list_and_pokedex() {
        let arena = arena();
        let lines = arena.list("Ash");
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            ServerMessage::PokemonListEntry {
                id: "0025".into(),
                name: "Pikachu".into(),
                level: 1,
                hp: 100
            }
        );
        assert!(matches!(arena.list("Gary")[0], ServerMessage::Info(_)));

        assert_eq!(
            arena.pokedex("Mew"),
            Err(EngineError::UnknownPokemon("Mew".into()))
        );
    }

    #[test]
    fn test_token_resolves_after_address_change() {
        let arena = arena();
        let ash = arena.join("Ash", addr(5000)).unwrap();

        let resolved = arena.resolve_token(&ash.token, addr(7000)).unwrap();
        assert_eq!(resolved.name, "Ash");
        assert_eq!(arena.endpoint_of("Ash"), Some(addr(7000)));
    }

    #[test]
    fn test_seeded_arena_is_reproducible() {
        let run = || {
            let arena = Arena::new(Roster::default(), PokemonStore::new()).with_seed(99);
            let mut roller = (arena.rollers)(SessionId(3));
            (0..8).map(|_| roller.roll()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attacks_are_serialized() {
        let arena = Arc::new(battling());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let arena = Arc::clone(&arena);
            handles.push(tokio::spawn(async move { arena.attack("Ash") }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert_eq!(e, EngineError::NotYourTurn),
            }
        }

        // Only the turn holder's first attack lands
        assert_eq!(accepted, 1);
        assert_eq!(arena.turn_holder("Ash").as_deref(), Some("Misty"));
        let shared = arena.session_of("Ash").unwrap();
        let session = lock(&shared);
        let staryu = session.squad_of("Misty").unwrap().active().unwrap();
        assert_eq!(staryu.current_hp, 80);
    }
}
