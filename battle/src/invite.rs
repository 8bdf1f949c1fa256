//! Pending one-to-one battle requests

use std::collections::HashSet;

use crate::error::EngineError;

/// What the broker needs to know about players it does not own
pub trait Presence {
    fn is_registered(&self, name: &str) -> bool;

    /// In a forming or active session
    fn is_busy(&self, name: &str) -> bool;
}

/// `from` challenged `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InviteRequest {
    pub from: String,
    pub to: String,
}

impl InviteRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

/// Directed set of outstanding requests, at most one per (from, to) pair
#[derive(Debug, Default)]
pub struct InviteBroker {
    pending: HashSet<InviteRequest>,
}

impl InviteBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request from `from` to `to`. Repeating a request is a no-op.
    pub fn challenge(
        &mut self,
        from: &str,
        to: &str,
        presence: &impl Presence,
    ) -> Result<InviteRequest, EngineError> {
        if from == to {
            return Err(EngineError::SelfChallenge);
        }
        if !presence.is_registered(to) {
            return Err(EngineError::UnknownOpponent(to.to_string()));
        }
        if presence.is_busy(to) {
            return Err(EngineError::OpponentBusy(to.to_string()));
        }
        if presence.is_busy(from) {
            return Err(EngineError::SenderBusy);
        }

        let request = InviteRequest::new(from, to);
        self.pending.insert(request.clone());
        Ok(request)
    }

    /// `accepter` takes up the request `challenger` sent them.
    ///
    /// The request is consumed only when both players are still free.
    pub fn accept(
        &mut self,
        accepter: &str,
        challenger: &str,
        presence: &impl Presence,
    ) -> Result<InviteRequest, EngineError> {
        let request = InviteRequest::new(challenger, accepter);
        if !self.pending.contains(&request) {
            return Err(EngineError::NoSuchInvite(challenger.to_string()));
        }
        if !presence.is_registered(challenger) {
            self.pending.remove(&request);
            return Err(EngineError::UnknownOpponent(challenger.to_string()));
        }
        if presence.is_busy(accepter) {
            return Err(EngineError::SenderBusy);
        }
        if presence.is_busy(challenger) {
            return Err(EngineError::OpponentBusy(challenger.to_string()));
        }

        self.pending.remove(&request);
        Ok(request)
    }

    /// `denier` turns down the request `challenger` sent them
    pub fn deny(&mut self, denier: &str, challenger: &str) -> Result<InviteRequest, EngineError> {
        let request = InviteRequest::new(challenger, denier);
        if self.pending.remove(&request) {
            Ok(request)
        } else {
            Err(EngineError::NoSuchInvite(challenger.to_string()))
        }
    }

    /// Forget every request sent or received by `name`
    pub fn drop_player(&mut self, name: &str) -> Vec<InviteRequest> {
        let dropped: Vec<_> = self
            .pending
            .iter()
            .filter(|request| request.involves(name))
            .cloned()
            .collect();
        for request in &dropped {
            self.pending.remove(request);
        }
        dropped
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.pending.contains(&InviteRequest::new(from, to))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
