//! Live sessions and which player sits in which

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::session::{BattleSession, SessionId};

pub type SharedSession = Arc<Mutex<BattleSession>>;

/// Forming and active sessions. Finished sessions are removed.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SharedSession>,
    members: HashMap<String, SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: BattleSession) -> SharedSession {
        let id = session.id();
        for player in session.players() {
            self.members.insert(player.to_string(), id);
        }
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, Arc::clone(&shared));
        shared
    }

    pub fn remove(&mut self, id: SessionId) -> Option<SharedSession> {
        self.members.retain(|_, member_of| *member_of != id);
        self.sessions.remove(&id)
    }

    pub fn session_id_of(&self, player: &str) -> Option<SessionId> {
        self.members.get(player).copied()
    }

    pub fn session_of(&self, player: &str) -> Option<SharedSession> {
        self.session_id_of(player)
            .and_then(|id| self.sessions.get(&id))
            .cloned()
    }

    pub fn contains_player(&self, player: &str) -> bool {
        self.members.contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
