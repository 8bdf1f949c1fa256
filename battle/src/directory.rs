//! Registered players, their session tokens and reply endpoints

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use rand::Rng;

use crate::error::EngineError;

/// Opaque token handed out on join
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// 16 random hex characters
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self(format!("{:016x}", rng.r#gen::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub token: SessionToken,
    /// Last address the player was seen at; used only to route replies
    pub endpoint: SocketAddr,
}

/// Name ↔ token ↔ endpoint lookup table.
///
/// The token is authoritative. The endpoint map is a cache that the token
/// path re-points when a player shows up from a new address.
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    by_name: HashMap<String, Identity>,
    by_token: HashMap<SessionToken, String>,
    by_endpoint: HashMap<SocketAddr, String>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` at `endpoint` and issue a fresh token
    pub fn register(&mut self, name: &str, endpoint: SocketAddr) -> Result<Identity, EngineError> {
        if self.by_name.contains_key(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        if self.by_endpoint.contains_key(&endpoint) {
            return Err(EngineError::DuplicateEndpoint);
        }

        let mut rng = rand::thread_rng();
        let mut token = SessionToken::generate(&mut rng);
        while self.by_token.contains_key(&token) {
            token = SessionToken::generate(&mut rng);
        }

        let identity = Identity {
            name: name.to_string(),
            token: token.clone(),
            endpoint,
        };
        self.by_token.insert(token, name.to_string());
        self.by_endpoint.insert(endpoint, name.to_string());
        self.by_name.insert(name.to_string(), identity.clone());
        Ok(identity)
    }

    /// Who sent from `endpoint`
    pub fn resolve(&self, endpoint: SocketAddr) -> Result<Identity, EngineError> {
        self.by_endpoint
            .get(&endpoint)
            .and_then(|name| self.by_name.get(name))
            .cloned()
            .ok_or(EngineError::UnknownEndpoint)
    }

    /// Who owns `token`; re-points the endpoint cache at `endpoint`
    pub fn resolve_token(
        &mut self,
        token: &SessionToken,
        endpoint: SocketAddr,
    ) -> Result<Identity, EngineError> {
        let name = self
            .by_token
            .get(token)
            .cloned()
            .ok_or(EngineError::InvalidToken)?;
        let identity = self
            .by_name
            .get_mut(&name)
            .ok_or(EngineError::InvalidToken)?;

        if identity.endpoint != endpoint {
            if self.by_endpoint.get(&identity.endpoint) == Some(&name) {
                self.by_endpoint.remove(&identity.endpoint);
            }
            identity.endpoint = endpoint;
            self.by_endpoint.insert(endpoint, name);
        }
        Ok(identity.clone())
    }

    pub fn get(&self, name: &str) -> Option<&Identity> {
        self.by_name.get(name)
    }

    pub fn endpoint_of(&self, name: &str) -> Option<SocketAddr> {
        self.by_name.get(name).map(|identity| identity.endpoint)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Remove `name`; the caller ends any session it is in first
    pub fn unregister(&mut self, name: &str) -> Option<Identity> {
        let identity = self.by_name.remove(name)?;
        self.by_token.remove(&identity.token);
        if self.by_endpoint.get(&identity.endpoint).map(String::as_str) == Some(name) {
            self.by_endpoint.remove(&identity.endpoint);
        }
        Some(identity)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut directory = IdentityDirectory::new();
        let ash = directory.register("Ash", addr(5000)).unwrap();

        assert_eq!(ash.name, "Ash");
        assert_eq!(ash.token.as_str().len(), 16);
        assert_eq!(directory.resolve(addr(5000)).unwrap(), ash);
        assert_eq!(directory.endpoint_of("Ash"), Some(addr(5000)));
    }

    #[test]
    fn test_duplicate_name_and_endpoint() {
        let mut directory = IdentityDirectory::new();
        directory.register("Ash", addr(5000)).unwrap();

        assert_eq!(
            directory.register("Ash", addr(5001)),
            Err(EngineError::DuplicateName("Ash".into()))
        );
        assert_eq!(
            directory.register("Misty", addr(5000)),
            Err(EngineError::DuplicateEndpoint)
        );
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_unknown_endpoint_and_token() {
        let mut directory = IdentityDirectory::new();
        assert_eq!(
            directory.resolve(addr(5000)),
            Err(EngineError::UnknownEndpoint)
        );
        assert_eq!(
            directory.resolve_token(&SessionToken::from("deadbeefdeadbeef"), addr(5000)),
            Err(EngineError::InvalidToken)
        );
    }

    #[test]
    fn test_token_rebinds_endpoint() {
        let mut directory = IdentityDirectory::new();
        let ash = directory.register("Ash", addr(5000)).unwrap();

        let moved = directory.resolve_token(&ash.token, addr(6000)).unwrap();
        assert_eq!(moved.endpoint, addr(6000));
        assert_eq!(directory.resolve(addr(6000)).unwrap().name, "Ash");
        assert_eq!(
            directory.resolve(addr(5000)),
            Err(EngineError::UnknownEndpoint)
        );

        // The freed address can be registered again
        directory.register("Misty", addr(5000)).unwrap();
    }

    #[test]
    fn test_unregister() {
        let mut directory = IdentityDirectory::new();
        let ash = directory.register("Ash", addr(5000)).unwrap();

        assert_eq!(directory.unregister("Ash"), Some(ash.clone()));
        assert!(!directory.contains("Ash"));
        assert!(directory.is_empty());
        assert_eq!(
            directory.resolve_token(&ash.token, addr(5000)),
            Err(EngineError::InvalidToken)
        );
        assert_eq!(directory.unregister("Ash"), None);

        // Name is free again
        directory.register("Ash", addr(5000)).unwrap();
    }

    #[test]
    fn test_tokens_are_distinct() {
        let mut directory = IdentityDirectory::new();
        let ash = directory.register("Ash", addr(5000)).unwrap();
        let misty = directory.register("Misty", addr(5001)).unwrap();
        assert_ne!(ash.token, misty.token);
    }
}
