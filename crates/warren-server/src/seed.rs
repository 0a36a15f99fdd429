//! The demo warren - a small world with every door policy in play.
//!
//! ```text
//!                      Old Wing (closed)
//!                            |
//! Lobby ================= Studio ============== Lounge ===== Roof Terrace
//!   |  \- disabled door to the lounge              |
//! Machine Room (locked in, allow-listed out)    alcove (dead end)
//! ```
//!
//! The lobby-studio and studio-lounge doors are plain two-way passages;
//! the lounge-roof door stacks a cooldown, a level marking, a reward
//! and a boost payload on one entrance. The machine room is entered with
//! a key and left through an allow-listed door.

use warren_logic::access::access_levels;
use warren_logic::constants::{activity_states, facings};
use warren_logic::graph::{self, FloorExtent};
use warren_logic::vitals::SpecialEffects;
use warren_logic::{ActorId, ConnectionId, EntranceId, RoomId};

use crate::entities::{Connection, Entrance, PlayerState, Room};
use crate::inventory::StaticKeyring;
use crate::memory::MemoryStore;
use crate::store::StoreError;

pub mod rooms {
    use warren_logic::RoomId;

    pub const LOBBY: RoomId = 1;
    pub const STUDIO: RoomId = 2;
    pub const LOUNGE: RoomId = 3;
    pub const MACHINE_ROOM: RoomId = 4;
    pub const ROOF: RoomId = 5;
    pub const OLD_WING: RoomId = 6;
}

pub mod actors {
    use warren_logic::ActorId;

    pub const RESIDENT: ActorId = 1;
    pub const VISITOR: ActorId = 2;
    pub const CUSTODIAN: ActorId = 3;
}

/// Key id the machine room door answers to. [`demo_keyring`] grants it
/// to the resident.
pub const MACHINE_ROOM_KEY: &str = "machine-room-key";

fn room(id: RoomId, name: &str, active: bool, length: i32, width: i32) -> Room {
    Room {
        id,
        name: name.to_string(),
        is_active: active,
        length,
        width,
        height: 3,
        owner: None,
    }
}

/// A plain enabled door on the wall midpoint of `face`.
fn door(id: EntranceId, room_id: RoomId, face: u8, extent: FloorExtent) -> Entrance {
    let (x, y) = graph::default_entrance_position(extent, face);
    Entrance {
        id,
        room_id,
        face,
        enabled: true,
        is_open: false,
        is_locked: false,
        required_key: None,
        allowed_actors: Vec::new(),
        access_level: access_levels::PUBLIC,
        usage_count: 0,
        last_opened: None,
        recent_uses: Vec::new(),
        cooldown_secs: 0,
        max_usage_per_hour: 0,
        energy_cost_modifier: 0,
        experience_reward: 0,
        special_effects: None,
        position_x: x,
        position_y: y,
        connection_id: None,
    }
}

fn edge(
    id: ConnectionId,
    from: RoomId,
    to: RoomId,
    entrance: EntranceId,
    bidirectional: bool,
    cost: i32,
) -> Connection {
    Connection {
        id,
        from_room: from,
        to_room: to,
        entrance_id: entrance,
        bidirectional,
        energy_cost: cost,
    }
}

fn player(
    actor: ActorId,
    tier: u8,
    current: RoomId,
    position: (i32, i32),
    energy: i32,
) -> PlayerState {
    PlayerState {
        actor_id: actor,
        access_tier: tier,
        current_room: Some(current),
        position_x: position.0,
        position_y: position.1,
        energy,
        productivity: 20,
        social: 20,
        activity: activity_states::IDLE,
        version: 0,
    }
}

/// Populate `store` with the demo warren. Fails only if the store
/// already holds conflicting records.
pub fn seed_demo_world(store: &MemoryStore) -> Result<(), StoreError> {
    let lobby = FloorExtent {
        length: 12,
        width: 10,
    };
    let studio = FloorExtent {
        length: 16,
        width: 12,
    };
    let lounge = FloorExtent {
        length: 10,
        width: 10,
    };
    let machine = FloorExtent {
        length: 8,
        width: 6,
    };
    let roof = FloorExtent {
        length: 14,
        width: 8,
    };

    store.insert_room(room(rooms::LOBBY, "Lobby", true, lobby.length, lobby.width))?;
    store.insert_room(room(
        rooms::STUDIO,
        "Studio",
        true,
        studio.length,
        studio.width,
    ))?;
    store.insert_room(room(
        rooms::LOUNGE,
        "Lounge",
        true,
        lounge.length,
        lounge.width,
    ))?;
    let mut machine_room = room(
        rooms::MACHINE_ROOM,
        "Machine Room",
        true,
        machine.length,
        machine.width,
    );
    machine_room.owner = Some(actors::CUSTODIAN);
    store.insert_room(machine_room)?;
    store.insert_room(room(rooms::ROOF, "Roof Terrace", true, roof.length, roof.width))?;
    store.insert_room(room(rooms::OLD_WING, "Old Wing", false, 10, 8))?;

    // Lobby <-> studio, the main thoroughfare.
    store.insert_entrance(door(101, rooms::LOBBY, facings::EAST, lobby))?;
    store.insert_entrance(door(102, rooms::STUDIO, facings::WEST, studio))?;

    // Studio <-> lounge, ceiling of three passages an hour.
    let mut studio_east = door(103, rooms::STUDIO, facings::EAST, studio);
    studio_east.max_usage_per_hour = 3;
    store.insert_entrance(studio_east)?;
    store.insert_entrance(door(104, rooms::LOUNGE, facings::WEST, lounge))?;

    // Into the machine room only with its key; out again only for the
    // allow-listed.
    let mut machine_in = door(105, rooms::LOBBY, facings::NORTH, lobby);
    machine_in.is_locked = true;
    machine_in.required_key = Some(MACHINE_ROOM_KEY.to_string());
    store.insert_entrance(machine_in)?;
    let mut machine_out = door(106, rooms::MACHINE_ROOM, facings::SOUTH, machine);
    machine_out.allowed_actors = vec![actors::RESIDENT, actors::CUSTODIAN];
    store.insert_entrance(machine_out)?;

    // The roof door stacks the most policy: a resident-level marking,
    // five minutes of cooldown, and a reward plus boost on arrival.
    let mut roof_up = door(107, rooms::LOUNGE, facings::NORTH, lounge);
    roof_up.access_level = access_levels::RESIDENT;
    roof_up.cooldown_secs = 300;
    roof_up.experience_reward = 15;
    roof_up.special_effects = Some(SpecialEffects {
        energy: 5,
        productivity: 0,
        social: 10,
    });
    store.insert_entrance(roof_up)?;

    // Still on the map, but the wing beyond is closed.
    store.insert_entrance(door(108, rooms::STUDIO, facings::NORTH, studio))?;

    // A bricked-over alcove; the validator flags it as a dead end.
    store.insert_entrance(door(109, rooms::LOUNGE, facings::SOUTH, lounge))?;

    // Retired lobby door, kept disabled rather than deleted.
    let mut old_lobby_door = door(110, rooms::LOBBY, facings::WEST, lobby);
    old_lobby_door.enabled = false;
    store.insert_entrance(old_lobby_door)?;

    store.insert_entrance(door(111, rooms::ROOF, facings::SOUTH, roof))?;

    store.insert_connection(edge(201, rooms::LOBBY, rooms::STUDIO, 101, true, 5))?;
    store.insert_connection(edge(202, rooms::STUDIO, rooms::LOBBY, 102, true, 5))?;
    store.insert_connection(edge(203, rooms::STUDIO, rooms::LOUNGE, 103, true, 3))?;
    store.insert_connection(edge(204, rooms::LOUNGE, rooms::STUDIO, 104, true, 3))?;
    store.insert_connection(edge(205, rooms::LOBBY, rooms::MACHINE_ROOM, 105, false, 4))?;
    store.insert_connection(edge(206, rooms::MACHINE_ROOM, rooms::LOBBY, 106, false, 1))?;
    store.insert_connection(edge(207, rooms::LOUNGE, rooms::ROOF, 107, true, 6))?;
    store.insert_connection(edge(208, rooms::STUDIO, rooms::OLD_WING, 108, true, 2))?;
    store.insert_connection(edge(210, rooms::LOBBY, rooms::LOUNGE, 110, true, 2))?;
    store.insert_connection(edge(211, rooms::ROOF, rooms::LOUNGE, 111, true, 0))?;

    store.insert_player(player(
        actors::RESIDENT,
        access_levels::RESIDENT,
        rooms::LOBBY,
        lobby.center(),
        100,
    ))?;
    store.insert_player(player(
        actors::VISITOR,
        access_levels::PUBLIC,
        rooms::LOBBY,
        lobby.center(),
        8,
    ))?;
    store.insert_player(player(
        actors::CUSTODIAN,
        access_levels::STAFF,
        rooms::MACHINE_ROOM,
        machine.center(),
        80,
    ))?;

    Ok(())
}

/// The key grants matching [`seed_demo_world`].
pub fn demo_keyring() -> StaticKeyring {
    StaticKeyring::new().grant(actors::RESIDENT, MACHINE_ROOM_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Keyring;
    use warren_logic::worldcheck;

    #[test]
    fn demo_world_seeds_every_record() {
        let store = MemoryStore::new();
        seed_demo_world(&store).unwrap();
        assert_eq!(store.counts().unwrap(), (6, 11, 10, 3));
    }

    #[test]
    fn demo_world_is_structurally_sound() {
        let store = MemoryStore::new();
        seed_demo_world(&store).unwrap();

        let (rooms, entrances, connections) = store.graph_snapshot().unwrap();
        let findings = worldcheck::validate_all(&rooms, &entrances, &connections);
        assert!(
            worldcheck::is_sound(&findings),
            "demo world has errors: {findings:?}"
        );

        // The alcove and the old-wing door are deliberate warnings.
        let categories: Vec<&str> = findings.iter().map(|f| f.category).collect();
        assert!(categories.contains(&"dead_end"));
        assert!(categories.contains(&"closed_room"));
    }

    #[test]
    fn the_resident_holds_the_machine_room_key() {
        let keyring = demo_keyring();
        assert!(keyring.holds_key(actors::RESIDENT, MACHINE_ROOM_KEY));
        assert!(!keyring.holds_key(actors::VISITOR, MACHINE_ROOM_KEY));
        assert!(!keyring.holds_key(actors::RESIDENT, "some-other-key"));
    }

    #[test]
    fn seeding_twice_conflicts() {
        let store = MemoryStore::new();
        seed_demo_world(&store).unwrap();
        assert!(seed_demo_world(&store).is_err());
    }
}
