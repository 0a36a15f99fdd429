//! The transition orchestrator - the single writer of actor state.
//!
//! Stateless: an engine holds only shared handles, so one instance can
//! serve every request. Each operation re-reads its records from the
//! store, decides through `warren_logic::pipeline`, and commits through
//! the store's atomic seam. Guard refusals are ordinary outcomes; only
//! unknown ids surface as errors (the HTTP layer's 404s); store faults
//! are logged and folded into a `SYSTEM_ERROR` outcome on the write
//! path so no infrastructure failure ever masquerades as game state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use warren_logic::graph::{self, ReturnAnchor};
use warren_logic::pipeline::{
    self, ActorFacts, Approval, Denial, DenyReason, LinkFacts, TransitionContext,
    TransitionPreview,
};
use warren_logic::vitals;
use warren_logic::{throttle, ActorId, ConnectionId, EntranceId, RoomId};

use crate::entities::{Entrance, PlayerState, Room};
use crate::events::{EventSink, TransitionEvent};
use crate::inventory::Keyring;
use crate::store::{StoreError, WorldStore};

/// Wall-clock seam. Tests pin it; everything downstream of the engine
/// sees unix seconds and nothing else.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Reads the system clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Failures the HTTP layer turns into status codes. Everything else a
/// transition can hit becomes a [`TransitionOutcome`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown actor #{0}")]
    UnknownActor(ActorId),
    #[error("unknown entrance #{0}")]
    UnknownEntrance(EntranceId),
    #[error("world unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Identifying slice of a room for response payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: RoomId,
    pub name: String,
}

/// What one transition attempt came to, success or typed refusal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_room: Option<RoomRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_cost: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_gained: Option<i32>,
}

impl TransitionOutcome {
    fn approved(approval: &Approval, experience: i32) -> Self {
        Self {
            success: true,
            message: format!("You pass through into {}.", approval.target_name),
            reason: None,
            target_room: Some(RoomRef {
                id: approval.target_room,
                name: approval.target_name.clone(),
            }),
            energy_cost: Some(approval.energy_cost),
            experience_gained: Some(experience),
        }
    }

    fn refused(denial: Denial) -> Self {
        Self {
            success: false,
            message: denial.message,
            reason: Some(denial.reason),
            target_room: None,
            energy_cost: None,
            experience_gained: None,
        }
    }

    fn fault() -> Self {
        Self {
            success: false,
            message: "Something went wrong; nothing was changed.".to_string(),
            reason: Some(DenyReason::SystemError),
            target_room: None,
            energy_cost: None,
            experience_gained: None,
        }
    }
}

/// Read-only connection summary for the inspection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub from_room: RoomRef,
    pub to_room: RoomRef,
    pub bidirectional: bool,
    pub energy_cost: i32,
}

/// Read-only entrance summary for the inspection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntranceInfo {
    pub id: EntranceId,
    pub room: RoomRef,
    pub face: u8,
    pub enabled: bool,
    pub is_open: bool,
    pub is_locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_key: Option<String>,
    pub access_level: u8,
    pub usage_count: u64,
    pub uses_last_hour: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<i64>,
    pub cooldown_secs: u32,
    pub cooldown_remaining_secs: i64,
    pub max_usage_per_hour: u32,
    pub energy_cost_modifier: i32,
    pub experience_reward: i32,
    pub position: (i32, i32),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
}

pub struct TransitionEngine {
    store: Arc<dyn WorldStore>,
    keyring: Arc<dyn Keyring>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl TransitionEngine {
    pub fn new(
        store: Arc<dyn WorldStore>,
        keyring: Arc<dyn Keyring>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self::with_clock(store, keyring, events, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn WorldStore>,
        keyring: Arc<dyn Keyring>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            keyring,
            events,
            clock,
        }
    }

    /// Run the guard chain for `actor` at `entrance` and commit the
    /// traversal if every guard passes.
    pub fn attempt_transition(
        &self,
        actor: ActorId,
        entrance: EntranceId,
    ) -> Result<TransitionOutcome, EngineError> {
        match self.try_transition(actor, entrance) {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::Unavailable(fault)) => {
                error!(actor, entrance, %fault, "transition aborted, state unchanged");
                Ok(TransitionOutcome::fault())
            }
            Err(other) => Err(other),
        }
    }

    fn try_transition(
        &self,
        actor: ActorId,
        entrance_id: EntranceId,
    ) -> Result<TransitionOutcome, EngineError> {
        let player = self
            .store
            .player(actor)?
            .ok_or(EngineError::UnknownActor(actor))?;
        let entrance = self
            .store
            .entrance(entrance_id)?
            .ok_or(EngineError::UnknownEntrance(entrance_id))?;
        let now = self.clock.now_unix();

        let ctx = self.load_context(&player, &entrance, now)?;
        let approval = match pipeline::evaluate(&ctx) {
            Ok(approval) => approval,
            Err(denial) => {
                debug!(
                    actor,
                    entrance = entrance_id,
                    reason = denial.reason.as_code(),
                    "transition refused"
                );
                return Ok(TransitionOutcome::refused(denial));
            }
        };

        let Some(origin) = player.current_room else {
            // evaluate() refuses actors outside any room
            return Ok(TransitionOutcome::fault());
        };

        let destination = self.store.room(approval.target_room)?.ok_or_else(|| {
            EngineError::Unavailable(StoreError::Missing {
                kind: "room",
                id: u64::from(approval.target_room),
            })
        })?;
        let anchors = self.return_anchors(approval.target_room)?;
        let spawn = graph::spawn_position(origin, destination.extent(), &anchors);

        let mut updated_player = player.clone();
        updated_player.current_room = Some(approval.target_room);
        updated_player.position_x = spawn.0;
        updated_player.position_y = spawn.1;
        updated_player.apply_vitals(vitals::settle(
            player.vitals(),
            approval.energy_cost,
            entrance.experience_reward,
            entrance.special_effects.as_ref(),
        ));
        updated_player.version += 1;

        let mut updated_entrance = entrance.clone();
        updated_entrance.is_open = false;
        updated_entrance.last_opened = Some(now);
        updated_entrance.usage_count += 1;
        updated_entrance.recent_uses = throttle::prune_window(&entrance.recent_uses, now);
        updated_entrance.recent_uses.push(now);

        self.store
            .commit_transition(&updated_player, &updated_entrance)?;

        self.events.publish(TransitionEvent {
            actor,
            from_room: origin,
            to_room: approval.target_room,
            entrance: entrance_id,
            energy_cost: approval.energy_cost,
            experience_gained: entrance.experience_reward,
            occurred_at: now,
        });
        info!(
            actor,
            from_room = origin,
            to_room = approval.target_room,
            entrance = entrance_id,
            cost = approval.energy_cost,
            "transition committed"
        );

        Ok(TransitionOutcome::approved(
            &approval,
            entrance.experience_reward,
        ))
    }

    /// Every enabled exit of the actor's current room, evaluated
    /// read-only. Actors outside any room get an empty list.
    pub fn available_transitions(
        &self,
        actor: ActorId,
    ) -> Result<Vec<TransitionPreview>, EngineError> {
        let player = self
            .store
            .player(actor)?
            .ok_or(EngineError::UnknownActor(actor))?;
        let Some(room_id) = player.current_room else {
            return Ok(Vec::new());
        };
        let now = self.clock.now_unix();

        let mut entries = Vec::new();
        for entrance in self.store.entrances_in_room(room_id)? {
            if !entrance.enabled {
                continue;
            }
            let ctx = self.load_context(&player, &entrance, now)?;
            entries.push(pipeline::preview(&ctx));
        }
        Ok(entries)
    }

    /// Full read-only summary of one entrance and its connection.
    pub fn entrance_info(&self, entrance_id: EntranceId) -> Result<EntranceInfo, EngineError> {
        let entrance = self
            .store
            .entrance(entrance_id)?
            .ok_or(EngineError::UnknownEntrance(entrance_id))?;
        let now = self.clock.now_unix();

        let room = self.room_ref(entrance.room_id)?;
        let connection = match entrance.connection_id {
            Some(id) => self.store.connection(id)?,
            None => None,
        };
        let connection = match connection {
            Some(c) => Some(ConnectionInfo {
                id: c.id,
                from_room: self.room_ref(c.from_room)?,
                to_room: self.room_ref(c.to_room)?,
                bidirectional: c.bidirectional,
                energy_cost: c.energy_cost,
            }),
            None => None,
        };

        Ok(EntranceInfo {
            id: entrance.id,
            room,
            face: entrance.face,
            enabled: entrance.enabled,
            is_open: entrance.is_open,
            is_locked: entrance.is_locked,
            required_key: entrance.required_key.clone(),
            access_level: entrance.access_level,
            usage_count: entrance.usage_count,
            uses_last_hour: throttle::uses_in_window(&entrance.recent_uses, now),
            last_opened: entrance.last_opened,
            cooldown_secs: entrance.cooldown_secs,
            cooldown_remaining_secs: throttle::cooldown_remaining(
                entrance.cooldown_secs,
                entrance.last_opened,
                now,
            ),
            max_usage_per_hour: entrance.max_usage_per_hour,
            energy_cost_modifier: entrance.energy_cost_modifier,
            experience_reward: entrance.experience_reward,
            position: entrance.position(),
            connection,
        })
    }

    fn load_context(
        &self,
        player: &PlayerState,
        entrance: &Entrance,
        now: i64,
    ) -> Result<TransitionContext, EngineError> {
        let connection = match entrance.connection_id {
            Some(id) => self.store.connection(id)?,
            None => None,
        };
        let (from_room, to_room) = match &connection {
            Some(c) => (self.store.room(c.from_room)?, self.store.room(c.to_room)?),
            None => (None, None),
        };
        let holds_key = match &entrance.required_key {
            Some(key) => self.keyring.holds_key(player.actor_id, key),
            None => false,
        };

        Ok(TransitionContext {
            now,
            actor: ActorFacts {
                actor: player.actor_id,
                current_room: player.current_room,
                tier: player.access_tier,
                vitals: player.vitals(),
                holds_key,
            },
            entrance: entrance.facts(),
            connection: connection.as_ref().map(|c| LinkFacts {
                link: c.link(),
                energy_cost: c.energy_cost,
            }),
            from_room: from_room.as_ref().map(Room::facts),
            to_room: to_room.as_ref().map(Room::facts),
        })
    }

    fn return_anchors(&self, room: RoomId) -> Result<Vec<ReturnAnchor>, EngineError> {
        let mut anchors = Vec::new();
        for entrance in self.store.entrances_in_room(room)? {
            let leads_to = match entrance.connection_id {
                Some(id) => self.store.connection(id)?.map(|c| c.to_room),
                None => None,
            };
            anchors.push(ReturnAnchor {
                leads_to,
                position: entrance.position(),
            });
        }
        Ok(anchors)
    }

    fn room_ref(&self, id: RoomId) -> Result<RoomRef, EngineError> {
        let room = self.store.room(id)?.ok_or_else(|| {
            EngineError::Unavailable(StoreError::Missing {
                kind: "room",
                id: u64::from(id),
            })
        })?;
        Ok(RoomRef {
            id: room.id,
            name: room.name,
        })
    }
}
