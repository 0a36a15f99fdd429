//! Storage seams - the repository traits the orchestrator depends on.
//!
//! Storage technology is swappable behind these traits; the engine only
//! ever sees them. The reference implementation is [`crate::memory`],
//! and test doubles are plain structs.

use thiserror::Error;

use crate::entities::{Connection, Entrance, PlayerState, Room};
use warren_logic::{ActorId, ConnectionId, EntranceId, RoomId};

/// Faults raised by a store. Guard refusals are never errors; these are
/// infrastructure problems the orchestrator folds into a `SYSTEM_ERROR`
/// outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The player row changed underneath the commit (version check).
    #[error("write conflict on actor {actor}: expected version {expected}")]
    Conflict { actor: ActorId, expected: u64 },
    /// A record the operation needs vanished between read and write.
    #[error("{kind} #{id} is gone")]
    Missing { kind: &'static str, id: u64 },
    /// A write would break a structural invariant of the room graph.
    #[error("graph invariant violated: {0}")]
    Invariant(String),
    /// The backend itself is unavailable or corrupt.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub trait RoomRepository: Send + Sync {
    fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError>;
}

pub trait EntranceRepository: Send + Sync {
    fn entrance(&self, id: EntranceId) -> Result<Option<Entrance>, StoreError>;
    /// All entrances attached to `room`, in id order.
    fn entrances_in_room(&self, room: RoomId) -> Result<Vec<Entrance>, StoreError>;
    fn connection(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError>;
}

pub trait PlayerRepository: Send + Sync {
    fn player(&self, actor: ActorId) -> Result<Option<PlayerState>, StoreError>;
}

/// The commit seam: persist one player update and one entrance update
/// together or not at all.
pub trait TransitionCommit: Send + Sync {
    /// `player.version` must be exactly one ahead of the stored row;
    /// otherwise the store refuses with [`StoreError::Conflict`] and
    /// leaves everything untouched.
    fn commit_transition(&self, player: &PlayerState, entrance: &Entrance)
        -> Result<(), StoreError>;
}

/// Everything the orchestrator needs from storage.
pub trait WorldStore:
    RoomRepository + EntranceRepository + PlayerRepository + TransitionCommit
{
}

impl<T> WorldStore for T where
    T: RoomRepository + EntranceRepository + PlayerRepository + TransitionCommit
{
}
