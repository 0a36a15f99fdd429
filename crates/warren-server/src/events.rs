//! Post-commit transition events.
//!
//! The orchestrator announces every committed transition on its way out.
//! Delivery is fire-and-forget and strictly after the commit, so a deaf
//! or dead consumer can never fail a committed move.

use serde::{Deserialize, Serialize};

use warren_logic::{ActorId, EntranceId, RoomId};

/// One committed traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub actor: ActorId,
    pub from_room: RoomId,
    pub to_room: RoomId,
    pub entrance: EntranceId,
    pub energy_cost: i32,
    pub experience_gained: i32,
    /// Unix seconds.
    pub occurred_at: i64,
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: TransitionEvent);
}

/// Swallows everything. The engine works fine with no consumer at all.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: TransitionEvent) {}
}

/// Bridges events into an async consumer task.
#[derive(Debug)]
pub struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<TransitionEvent>,
}

impl ChannelSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<TransitionEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: TransitionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("transition event dropped: consumer is gone");
        }
    }
}
