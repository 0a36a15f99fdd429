//! Room graph resolution - connection endpoints, costs, spawn geometry.
//!
//! A connection is a directed edge anchored at one entrance in its origin
//! room; the `bidirectional` flag additionally opens it from the far end.
//! Rooms are integer-metre rectangles with the origin corner at (0, 0),
//! x running along the length and y along the width.

use serde::{Deserialize, Serialize};

use crate::constants::facings;
use crate::RoomId;

/// The endpoints and traversal flag of a connection, as resolution
/// needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_room: RoomId,
    pub to_room: RoomId,
    pub bidirectional: bool,
}

/// Integer floor extents of a room, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorExtent {
    pub length: i32,
    pub width: i32,
}

impl FloorExtent {
    /// Geometric centre, the fallback spawn point when no return
    /// entrance declares one.
    pub fn center(&self) -> (i32, i32) {
        (self.length / 2, self.width / 2)
    }
}

/// Resolve the room an actor standing in `current` reaches over `link`.
///
/// Forward traversal requires `current` to be the origin; reverse
/// traversal is only open when the link is bidirectional. `None` models
/// an edge the actor cannot take from here and surfaces upstream as an
/// invalid destination.
pub fn resolve_target(current: RoomId, link: &Link) -> Option<RoomId> {
    if link.from_room == current {
        Some(link.to_room)
    } else if link.to_room == current && link.bidirectional {
        Some(link.from_room)
    } else {
        None
    }
}

/// Energy charged for one traversal: connection base plus the entrance
/// modifier, never below zero.
pub fn transition_cost(base_cost: i32, entrance_modifier: i32) -> i32 {
    (base_cost + entrance_modifier).max(0)
}

/// Wall midpoint for an entrance of the given facing. North is +y.
pub fn default_entrance_position(extent: FloorExtent, face: u8) -> (i32, i32) {
    match face {
        facings::NORTH => (extent.length / 2, extent.width),
        facings::SOUTH => (extent.length / 2, 0),
        facings::EAST => (extent.length, extent.width / 2),
        facings::WEST => (0, extent.width / 2),
        _ => extent.center(),
    }
}

/// A destination-room entrance considered as a spawn point for arrivals.
/// `leads_to` is where that entrance's own connection goes, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnAnchor {
    pub leads_to: Option<RoomId>,
    pub position: (i32, i32),
}

/// Where an actor arriving from `origin` lands inside the destination.
///
/// Prefers a destination entrance whose own connection leads back to the
/// origin room; otherwise the geometric centre of the destination floor.
pub fn spawn_position(
    origin: RoomId,
    destination_extent: FloorExtent,
    anchors: &[ReturnAnchor],
) -> (i32, i32) {
    anchors
        .iter()
        .find(|a| a.leads_to == Some(origin))
        .map(|a| a.position)
        .unwrap_or_else(|| destination_extent.center())
}
