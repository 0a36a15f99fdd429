//! Entrance access policy - locks, keys, allow-lists, access levels.
//!
//! Entrances carry their whole policy as data. Callers flatten the
//! entrance row and the actor's facts (key possession comes from the
//! inventory collaborator) into a [`PassRequest`]; nothing here touches
//! storage.
//!
//! # Check Order
//!
//! | # | Check | Denial |
//! |---|-------|--------|
//! | 1 | locked, key configured, actor lacks it | `RequiresKey` |
//! | 2 | locked with no key configured | `Locked` |
//! | 3 | allow-list non-empty, actor not on it | `NotAllowed` |
//! | 4 | access level | none in the base policy |
//!
//! The first failing check wins; later checks are not evaluated. A held
//! key opens a locked door but never bypasses the allow-list. Access
//! levels ride along as data; check 4 is the seam where tiered refusal
//! would land once a rank model exists.

use serde::{Deserialize, Serialize};

use crate::ActorId;

/// Access tiers an entrance can be marked with. A zeroed entrance is the
/// least restrictive one.
pub mod access_levels {
    /// Anyone can pass.
    pub const PUBLIC: u8 = 0;
    /// Actors registered with the world.
    pub const RESIDENT: u8 = 1;
    /// Operational staff.
    pub const STAFF: u8 = 2;
    /// Room owners and administrators.
    pub const OWNER: u8 = 3;

    pub fn name(level: u8) -> &'static str {
        match level {
            PUBLIC => "public",
            RESIDENT => "resident",
            STAFF => "staff",
            OWNER => "owner",
            _ => "unknown",
        }
    }
}

/// A request to pass through an entrance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassRequest {
    pub actor: ActorId,
    /// The actor's access tier (see [`access_levels`]).
    pub actor_tier: u8,
    /// Whether the actor holds the entrance's configured key.
    pub holds_key: bool,
    /// Whether the entrance is locked.
    pub locked: bool,
    /// Key id the lock answers to, if one is configured.
    pub required_key: Option<String>,
    /// Actors allowed through; empty means unrestricted.
    pub allowed_actors: Vec<ActorId>,
    /// Tier the entrance is marked with.
    pub required_tier: u8,
}

/// Result of an access check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassDecision {
    pub allowed: bool,
    pub denial: Option<AccessDenial>,
}

impl PassDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            denial: None,
        }
    }

    fn deny(denial: AccessDenial) -> Self {
        Self {
            allowed: false,
            denial: Some(denial),
        }
    }
}

/// Why a pass was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDenial {
    /// Locked, and the configured key is not in the actor's possession.
    RequiresKey,
    /// Locked with no key path at all.
    Locked,
    /// An allow-list is in force and the actor is not on it.
    NotAllowed,
}

impl AccessDenial {
    pub fn message(&self) -> &'static str {
        match self {
            AccessDenial::RequiresKey => "This door needs a key you do not carry.",
            AccessDenial::Locked => "This door is locked.",
            AccessDenial::NotAllowed => "You are not on the list for this door.",
        }
    }
}

/// Check whether an actor may pass through an entrance.
pub fn check_pass(req: &PassRequest) -> PassDecision {
    if req.locked {
        match &req.required_key {
            Some(_) if !req.holds_key => return PassDecision::deny(AccessDenial::RequiresKey),
            None => return PassDecision::deny(AccessDenial::Locked),
            // Key configured and held; the lock opens.
            Some(_) => {}
        }
    }

    if !req.allowed_actors.is_empty() && !req.allowed_actors.contains(&req.actor) {
        return PassDecision::deny(AccessDenial::NotAllowed);
    }

    // Check 4, access level: `required_tier` is carried as data but the
    // base policy never refuses on it. Tiered refusal slots in here.

    PassDecision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_request(actor: ActorId) -> PassRequest {
        PassRequest {
            actor,
            actor_tier: access_levels::RESIDENT,
            holds_key: false,
            locked: false,
            required_key: None,
            allowed_actors: Vec::new(),
            required_tier: access_levels::PUBLIC,
        }
    }

    #[test]
    fn unrestricted_entrance_allows_anyone() {
        let decision = check_pass(&open_request(42));
        assert!(decision.allowed);
        assert_eq!(decision.denial, None);
    }

    #[test]
    fn locked_with_key_configured_requires_the_key() {
        let req = PassRequest {
            locked: true,
            required_key: Some("brass-key".to_string()),
            ..open_request(1)
        };
        let decision = check_pass(&req);
        assert!(!decision.allowed);
        assert_eq!(decision.denial, Some(AccessDenial::RequiresKey));
    }

    #[test]
    fn held_key_opens_the_lock() {
        let req = PassRequest {
            locked: true,
            required_key: Some("brass-key".to_string()),
            holds_key: true,
            ..open_request(1)
        };
        assert!(check_pass(&req).allowed);
    }

    #[test]
    fn locked_without_key_path_stays_shut() {
        let req = PassRequest {
            locked: true,
            // holds_key is irrelevant when no key is configured
            holds_key: true,
            ..open_request(1)
        };
        let decision = check_pass(&req);
        assert!(!decision.allowed);
        assert_eq!(decision.denial, Some(AccessDenial::Locked));
    }

    #[test]
    fn allow_list_blocks_strangers() {
        let req = PassRequest {
            allowed_actors: vec![7, 8],
            ..open_request(9)
        };
        let decision = check_pass(&req);
        assert!(!decision.allowed);
        assert_eq!(decision.denial, Some(AccessDenial::NotAllowed));
    }

    #[test]
    fn allow_list_admits_members() {
        let req = PassRequest {
            allowed_actors: vec![7, 8],
            ..open_request(8)
        };
        assert!(check_pass(&req).allowed);
    }

    #[test]
    fn access_levels_do_not_refuse() {
        // Levels are data only; a public visitor passes an owner-marked
        // door as long as every other check does.
        let req = PassRequest {
            actor_tier: access_levels::PUBLIC,
            required_tier: access_levels::OWNER,
            ..open_request(1)
        };
        assert!(check_pass(&req).allowed);
    }

    #[test]
    fn lock_check_runs_before_the_allow_list() {
        let req = PassRequest {
            locked: true,
            required_key: Some("brass-key".to_string()),
            allowed_actors: vec![7],
            ..open_request(9)
        };
        // Both checks would fail; the key denial wins.
        assert_eq!(check_pass(&req).denial, Some(AccessDenial::RequiresKey));
    }

    #[test]
    fn acceptance_key_does_not_bypass_the_allow_list() {
        let req = PassRequest {
            locked: true,
            required_key: Some("brass-key".to_string()),
            holds_key: true,
            allowed_actors: vec![7],
            ..open_request(9)
        };
        let decision = check_pass(&req);
        assert!(!decision.allowed);
        assert_eq!(decision.denial, Some(AccessDenial::NotAllowed));
    }
}
