//! The key possession seam.
//!
//! Keys live in an external inventory system; the guard chain only ever
//! asks one question about them. [`NoKeys`] is the default answer when
//! no inventory is wired, and [`StaticKeyring`] backs the demo world and
//! tests with fixed grants.

use std::collections::HashSet;

use warren_logic::ActorId;

pub trait Keyring: Send + Sync {
    /// Whether `actor` currently holds `key`.
    fn holds_key(&self, actor: ActorId, key: &str) -> bool;
}

/// Nobody holds anything; locked keyed doors always refuse.
#[derive(Debug, Default)]
pub struct NoKeys;

impl Keyring for NoKeys {
    fn holds_key(&self, _actor: ActorId, _key: &str) -> bool {
        false
    }
}

/// Fixed grants, assembled up front.
#[derive(Debug, Default)]
pub struct StaticKeyring {
    grants: HashSet<(ActorId, String)>,
}

impl StaticKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, actor: ActorId, key: &str) -> Self {
        self.grants.insert((actor, key.to_string()));
        self
    }
}

impl Keyring for StaticKeyring {
    fn holds_key(&self, actor: ActorId, key: &str) -> bool {
        self.grants.contains(&(actor, key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keys_refuses_everything() {
        assert!(!NoKeys.holds_key(1, "brass-key"));
    }

    #[test]
    fn static_grants_are_per_actor_and_key() {
        let keyring = StaticKeyring::new().grant(1, "brass-key");
        assert!(keyring.holds_key(1, "brass-key"));
        assert!(!keyring.holds_key(2, "brass-key"));
        assert!(!keyring.holds_key(1, "iron-key"));
    }
}
