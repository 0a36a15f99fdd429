//! Structural validation for room-graph worlds.
//!
//! Pure functions that take room/entrance/connection data and return
//! validation findings. No storage dependency; the server runs these at
//! startup over its seed and the harness runs them over fixture worlds.

use std::collections::{HashMap, HashSet};

use crate::constants::facings;
use crate::{ConnectionId, EntranceId, RoomId};

/// Minimal room data needed for graph validation.
#[derive(Debug, Clone)]
pub struct RoomSnap {
    pub id: RoomId,
    pub name: String,
    pub active: bool,
    pub length: i32,
    pub width: i32,
}

/// Minimal entrance data needed for graph validation.
#[derive(Debug, Clone)]
pub struct EntranceSnap {
    pub id: EntranceId,
    pub room: RoomId,
    pub face: u8,
    pub connection: Option<ConnectionId>,
    pub x: i32,
    pub y: i32,
}

/// Minimal connection data needed for graph validation.
#[derive(Debug, Clone)]
pub struct ConnectionSnap {
    pub id: ConnectionId,
    pub from_room: RoomId,
    pub to_room: RoomId,
    pub entrance: EntranceId,
}

/// A graph validation finding.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Rooms ─────────────────────────────────────────────────────────────

/// Check that no room has zero or negative floor dimensions.
pub fn check_room_dimensions(rooms: &[RoomSnap]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for r in rooms {
        if r.length <= 0 || r.width <= 0 {
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!(
                    "Room #{} ({}) has non-positive floor: {}x{}",
                    r.id, r.name, r.length, r.width
                ),
            });
        }
    }
    errors
}

// ── B. Entrances ─────────────────────────────────────────────────────────

/// Check that every entrance is anchored in an existing room.
pub fn check_entrance_rooms_exist(
    entrances: &[EntranceSnap],
    rooms: &[RoomSnap],
) -> Vec<ValidationError> {
    let room_ids: HashSet<RoomId> = rooms.iter().map(|r| r.id).collect();
    let mut errors = Vec::new();
    for e in entrances {
        if !room_ids.contains(&e.room) {
            errors.push(ValidationError {
                category: "entrance_anchor",
                severity: Severity::Error,
                message: format!("Entrance #{} sits in missing room #{}", e.id, e.room),
            });
        }
    }
    errors
}

/// Check that entrance facings name a wall.
pub fn check_entrance_facings(entrances: &[EntranceSnap]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for e in entrances {
        if !facings::is_valid(e.face) {
            errors.push(ValidationError {
                category: "entrance_anchor",
                severity: Severity::Error,
                message: format!("Entrance #{} has unknown facing {}", e.id, e.face),
            });
        }
    }
    errors
}

/// Check that entrance positions fall inside their room's floor.
pub fn check_entrance_positions(
    entrances: &[EntranceSnap],
    rooms: &[RoomSnap],
) -> Vec<ValidationError> {
    let by_id: HashMap<RoomId, &RoomSnap> = rooms.iter().map(|r| (r.id, r)).collect();
    let mut errors = Vec::new();
    for e in entrances {
        let Some(room) = by_id.get(&e.room) else {
            continue; // caught by the anchor check
        };
        if e.x < 0 || e.x > room.length || e.y < 0 || e.y > room.width {
            errors.push(ValidationError {
                category: "entrance_anchor",
                severity: Severity::Warning,
                message: format!(
                    "Entrance #{} sits at ({}, {}) outside room #{} ({}x{})",
                    e.id, e.x, e.y, room.id, room.length, room.width
                ),
            });
        }
    }
    errors
}

/// Entrances without a connection are dead ends. Legal, worth knowing.
pub fn check_dead_ends(entrances: &[EntranceSnap]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for e in entrances {
        if e.connection.is_none() {
            errors.push(ValidationError {
                category: "dead_end",
                severity: Severity::Warning,
                message: format!("Entrance #{} in room #{} leads nowhere", e.id, e.room),
            });
        }
    }
    errors
}

// ── C. Connections ───────────────────────────────────────────────────────

/// Check that both connection endpoints exist.
pub fn check_connection_rooms_exist(
    connections: &[ConnectionSnap],
    rooms: &[RoomSnap],
) -> Vec<ValidationError> {
    let room_ids: HashSet<RoomId> = rooms.iter().map(|r| r.id).collect();
    let mut errors = Vec::new();
    for c in connections {
        for room in [c.from_room, c.to_room] {
            if !room_ids.contains(&room) {
                errors.push(ValidationError {
                    category: "connection_endpoints",
                    severity: Severity::Error,
                    message: format!("Connection #{} touches missing room #{}", c.id, room),
                });
            }
        }
    }
    errors
}

/// Check that every connection is anchored at an entrance of its origin
/// room, and that the entrance links back to exactly this connection.
pub fn check_connection_anchoring(
    connections: &[ConnectionSnap],
    entrances: &[EntranceSnap],
) -> Vec<ValidationError> {
    let by_id: HashMap<EntranceId, &EntranceSnap> = entrances.iter().map(|e| (e.id, e)).collect();
    let mut errors = Vec::new();
    for c in connections {
        let Some(entrance) = by_id.get(&c.entrance) else {
            errors.push(ValidationError {
                category: "connection_anchor",
                severity: Severity::Error,
                message: format!(
                    "Connection #{} is anchored at missing entrance #{}",
                    c.id, c.entrance
                ),
            });
            continue;
        };
        if entrance.room != c.from_room {
            errors.push(ValidationError {
                category: "connection_anchor",
                severity: Severity::Error,
                message: format!(
                    "Connection #{} starts in room #{} but its entrance #{} sits in room #{}",
                    c.id, c.from_room, c.entrance, entrance.room
                ),
            });
        }
        if entrance.connection != Some(c.id) {
            errors.push(ValidationError {
                category: "connection_anchor",
                severity: Severity::Error,
                message: format!(
                    "Entrance #{} does not link back to connection #{}",
                    c.entrance, c.id
                ),
            });
        }
    }
    errors
}

/// Check that no entrance anchors more than one connection.
pub fn check_single_anchoring(connections: &[ConnectionSnap]) -> Vec<ValidationError> {
    let mut seen: HashMap<EntranceId, ConnectionId> = HashMap::new();
    let mut errors = Vec::new();
    for c in connections {
        if let Some(first) = seen.get(&c.entrance) {
            errors.push(ValidationError {
                category: "connection_anchor",
                severity: Severity::Error,
                message: format!(
                    "Entrance #{} anchors connections #{} and #{}",
                    c.entrance, first, c.id
                ),
            });
        } else {
            seen.insert(c.entrance, c.id);
        }
    }
    errors
}

/// Check that no (from, to, entrance) triple repeats.
pub fn check_duplicate_edges(connections: &[ConnectionSnap]) -> Vec<ValidationError> {
    let mut seen: HashSet<(RoomId, RoomId, EntranceId)> = HashSet::new();
    let mut errors = Vec::new();
    for c in connections {
        if !seen.insert((c.from_room, c.to_room, c.entrance)) {
            errors.push(ValidationError {
                category: "connection_duplicate",
                severity: Severity::Error,
                message: format!(
                    "Duplicate edge #{}: room #{} to room #{} via entrance #{}",
                    c.id, c.from_room, c.to_room, c.entrance
                ),
            });
        }
    }
    errors
}

/// Connections into inactive rooms are traversal-time refusals waiting
/// to happen. Legal, worth knowing.
pub fn check_inactive_destinations(
    connections: &[ConnectionSnap],
    rooms: &[RoomSnap],
) -> Vec<ValidationError> {
    let by_id: HashMap<RoomId, &RoomSnap> = rooms.iter().map(|r| (r.id, r)).collect();
    let mut errors = Vec::new();
    for c in connections {
        if let Some(room) = by_id.get(&c.to_room) {
            if !room.active {
                errors.push(ValidationError {
                    category: "closed_room",
                    severity: Severity::Warning,
                    message: format!(
                        "Connection #{} leads into inactive room #{} ({})",
                        c.id, room.id, room.name
                    ),
                });
            }
        }
    }
    errors
}

/// Run every check and collect the findings.
pub fn validate_all(
    rooms: &[RoomSnap],
    entrances: &[EntranceSnap],
    connections: &[ConnectionSnap],
) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_room_dimensions(rooms));
    all.extend(check_entrance_rooms_exist(entrances, rooms));
    all.extend(check_entrance_facings(entrances));
    all.extend(check_entrance_positions(entrances, rooms));
    all.extend(check_dead_ends(entrances));
    all.extend(check_connection_rooms_exist(connections, rooms));
    all.extend(check_connection_anchoring(connections, entrances));
    all.extend(check_single_anchoring(connections));
    all.extend(check_duplicate_edges(connections));
    all.extend(check_inactive_destinations(connections, rooms));
    all
}

/// True if no finding is a hard error.
pub fn is_sound(findings: &[ValidationError]) -> bool {
    findings.iter().all(|f| f.severity != Severity::Error)
}
