//! Durable records for the warren world.
//!
//! Plain serde structs keyed by integer ids. The store owns them; the
//! orchestrator works on owned copies read fresh per request and never
//! holds references into the store across an operation.

use serde::{Deserialize, Serialize};

use warren_logic::graph::{FloorExtent, Link};
use warren_logic::pipeline::{EntranceFacts, RoomFacts};
use warren_logic::vitals::{SpecialEffects, Vitals};
use warren_logic::worldcheck::{ConnectionSnap, EntranceSnap, RoomSnap};
use warren_logic::{ActorId, ConnectionId, EntranceId, RoomId};

/// A node in the room graph. Floor dimensions are integer metres with
/// the origin corner at (0, 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Display name, unique across the world.
    pub name: String,
    /// Inactive rooms stay in the graph but refuse arrivals.
    pub is_active: bool,
    pub length: i32,
    pub width: i32,
    pub height: i32,
    pub owner: Option<ActorId>,
}

impl Room {
    pub fn extent(&self) -> FloorExtent {
        FloorExtent {
            length: self.length,
            width: self.width,
        }
    }

    pub fn facts(&self) -> RoomFacts {
        RoomFacts {
            id: self.id,
            name: self.name.clone(),
            active: self.is_active,
        }
    }

    pub fn snap(&self) -> RoomSnap {
        RoomSnap {
            id: self.id,
            name: self.name.clone(),
            active: self.is_active,
            length: self.length,
            width: self.width,
        }
    }
}

/// A door in one room's wall. Carries its whole access and throttle
/// policy as data.
///
/// `is_open`, `last_opened`, `usage_count`, and `recent_uses` are the
/// only fields the orchestrator writes, always inside the transition
/// commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entrance {
    pub id: EntranceId,
    pub room_id: RoomId,
    /// Wall this entrance sits in (see `warren_logic::constants::facings`).
    pub face: u8,
    pub enabled: bool,
    pub is_open: bool,
    pub is_locked: bool,
    /// Key id the lock answers to, if one is configured.
    pub required_key: Option<String>,
    /// Actors allowed through; empty means unrestricted.
    #[serde(default)]
    pub allowed_actors: Vec<ActorId>,
    /// Level marking (see `warren_logic::access::access_levels`); data
    /// only, the base policy never refuses on it.
    pub access_level: u8,
    pub usage_count: u64,
    /// Unix seconds of the most recent passage.
    pub last_opened: Option<i64>,
    /// Rolling use log for the hourly ceiling; pruned at commit time.
    #[serde(default)]
    pub recent_uses: Vec<i64>,
    pub cooldown_secs: u32,
    /// Zero means no ceiling.
    pub max_usage_per_hour: u32,
    pub energy_cost_modifier: i32,
    pub experience_reward: i32,
    pub special_effects: Option<SpecialEffects>,
    pub position_x: i32,
    pub position_y: i32,
    /// At most one connection, anchored here. Wired by the store when
    /// the connection is inserted.
    pub connection_id: Option<ConnectionId>,
}

impl Entrance {
    pub fn position(&self) -> (i32, i32) {
        (self.position_x, self.position_y)
    }

    pub fn facts(&self) -> EntranceFacts {
        EntranceFacts {
            entrance: self.id,
            face: self.face,
            enabled: self.enabled,
            locked: self.is_locked,
            required_key: self.required_key.clone(),
            allowed_actors: self.allowed_actors.clone(),
            required_tier: self.access_level,
            cooldown_secs: self.cooldown_secs,
            max_usage_per_hour: self.max_usage_per_hour,
            last_opened: self.last_opened,
            recent_uses: self.recent_uses.clone(),
            energy_cost_modifier: self.energy_cost_modifier,
        }
    }

    pub fn snap(&self) -> EntranceSnap {
        EntranceSnap {
            id: self.id,
            room: self.room_id,
            face: self.face,
            connection: self.connection_id,
            x: self.position_x,
            y: self.position_y,
        }
    }
}

/// A directed edge between two rooms, anchored at one entrance of its
/// origin room. `bidirectional` additionally opens it from the far end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from_room: RoomId,
    pub to_room: RoomId,
    pub entrance_id: EntranceId,
    pub bidirectional: bool,
    /// Base energy charge; the entrance modifier is added on top.
    pub energy_cost: i32,
}

impl Connection {
    pub fn link(&self) -> Link {
        Link {
            from_room: self.from_room,
            to_room: self.to_room,
            bidirectional: self.bidirectional,
        }
    }

    pub fn snap(&self) -> ConnectionSnap {
        ConnectionSnap {
            id: self.id,
            from_room: self.from_room,
            to_room: self.to_room,
            entrance: self.entrance_id,
        }
    }
}

/// One record per actor in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub actor_id: ActorId,
    /// Access tier granted by the identity layer.
    pub access_tier: u8,
    /// None for actors not yet placed in the world.
    pub current_room: Option<RoomId>,
    pub position_x: i32,
    pub position_y: i32,
    pub energy: i32,
    pub productivity: i32,
    pub social: i32,
    /// See `warren_logic::constants::activity_states`.
    pub activity: u8,
    /// Bumped on every committed mutation; the commit seam checks it.
    pub version: u64,
}

impl PlayerState {
    pub fn vitals(&self) -> Vitals {
        Vitals {
            energy: self.energy,
            productivity: self.productivity,
            social: self.social,
        }
    }

    pub fn apply_vitals(&mut self, vitals: Vitals) {
        self.energy = vitals.energy;
        self.productivity = vitals.productivity;
        self.social = vitals.social;
    }
}
