//! The reference in-memory store.
//!
//! World state behind one `RwLock`. Reads hand out owned copies; the
//! orchestrator never borrows store internals across an operation. The
//! transition commit takes the write lock once and applies both record
//! updates under it, so a commit either lands whole or not at all.
//!
//! Graph invariants are enforced at insertion time: a connection must
//! anchor at an entrance of its origin room, an entrance anchors at most
//! one connection, and no (from, to, entrance) triple repeats.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entities::{Connection, Entrance, PlayerState, Room};
use crate::store::{
    EntranceRepository, PlayerRepository, RoomRepository, StoreError, TransitionCommit,
};
use warren_logic::constants::facings;
use warren_logic::worldcheck::{ConnectionSnap, EntranceSnap, RoomSnap};
use warren_logic::{ActorId, ConnectionId, EntranceId, RoomId};

#[derive(Debug, Default)]
struct WorldData {
    rooms: BTreeMap<RoomId, Room>,
    entrances: BTreeMap<EntranceId, Entrance>,
    connections: BTreeMap<ConnectionId, Connection>,
    players: BTreeMap<ActorId, PlayerState>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<WorldData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, WorldData>, StoreError> {
        self.data
            .read()
            .map_err(|_| StoreError::Backend("world lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, WorldData>, StoreError> {
        self.data
            .write()
            .map_err(|_| StoreError::Backend("world lock poisoned".to_string()))
    }

    pub fn insert_room(&self, room: Room) -> Result<(), StoreError> {
        let mut data = self.write()?;
        if data.rooms.contains_key(&room.id) {
            return Err(StoreError::Invariant(format!(
                "room #{} already exists",
                room.id
            )));
        }
        if data.rooms.values().any(|r| r.name == room.name) {
            return Err(StoreError::Invariant(format!(
                "room name '{}' is taken",
                room.name
            )));
        }
        if room.length <= 0 || room.width <= 0 {
            return Err(StoreError::Invariant(format!(
                "room #{} has a non-positive floor",
                room.id
            )));
        }
        data.rooms.insert(room.id, room);
        Ok(())
    }

    pub fn insert_entrance(&self, entrance: Entrance) -> Result<(), StoreError> {
        let mut data = self.write()?;
        if data.entrances.contains_key(&entrance.id) {
            return Err(StoreError::Invariant(format!(
                "entrance #{} already exists",
                entrance.id
            )));
        }
        if !data.rooms.contains_key(&entrance.room_id) {
            return Err(StoreError::Invariant(format!(
                "entrance #{} names missing room #{}",
                entrance.id, entrance.room_id
            )));
        }
        if !facings::is_valid(entrance.face) {
            return Err(StoreError::Invariant(format!(
                "entrance #{} has unknown facing {}",
                entrance.id, entrance.face
            )));
        }
        if entrance.connection_id.is_some() {
            return Err(StoreError::Invariant(format!(
                "entrance #{} pre-wires a connection; use insert_connection",
                entrance.id
            )));
        }
        data.entrances.insert(entrance.id, entrance);
        Ok(())
    }

    /// Create the edge and anchor it at its origin entrance.
    pub fn insert_connection(&self, connection: Connection) -> Result<(), StoreError> {
        let mut data = self.write()?;
        if data.connections.contains_key(&connection.id) {
            return Err(StoreError::Invariant(format!(
                "connection #{} already exists",
                connection.id
            )));
        }
        for room in [connection.from_room, connection.to_room] {
            if !data.rooms.contains_key(&room) {
                return Err(StoreError::Invariant(format!(
                    "connection #{} names missing room #{}",
                    connection.id, room
                )));
            }
        }
        let Some(entrance) = data.entrances.get(&connection.entrance_id) else {
            return Err(StoreError::Invariant(format!(
                "connection #{} names missing entrance #{}",
                connection.id, connection.entrance_id
            )));
        };
        if entrance.room_id != connection.from_room {
            return Err(StoreError::Invariant(format!(
                "connection #{} starts in room #{} but entrance #{} sits in room #{}",
                connection.id, connection.from_room, connection.entrance_id, entrance.room_id
            )));
        }
        if entrance.connection_id.is_some() {
            return Err(StoreError::Invariant(format!(
                "entrance #{} already anchors a connection",
                connection.entrance_id
            )));
        }
        let duplicate = data.connections.values().any(|c| {
            (c.from_room, c.to_room, c.entrance_id)
                == (
                    connection.from_room,
                    connection.to_room,
                    connection.entrance_id,
                )
        });
        if duplicate {
            return Err(StoreError::Invariant(format!(
                "duplicate edge: room #{} to room #{} via entrance #{}",
                connection.from_room, connection.to_room, connection.entrance_id
            )));
        }

        let id = connection.id;
        let entrance_id = connection.entrance_id;
        data.connections.insert(id, connection);
        if let Some(e) = data.entrances.get_mut(&entrance_id) {
            e.connection_id = Some(id);
        }
        Ok(())
    }

    pub fn insert_player(&self, player: PlayerState) -> Result<(), StoreError> {
        let mut data = self.write()?;
        if data.players.contains_key(&player.actor_id) {
            return Err(StoreError::Invariant(format!(
                "actor #{} already exists",
                player.actor_id
            )));
        }
        if let Some(room_id) = player.current_room {
            let Some(room) = data.rooms.get(&room_id) else {
                return Err(StoreError::Invariant(format!(
                    "actor #{} placed in missing room #{}",
                    player.actor_id, room_id
                )));
            };
            if !room.is_active {
                return Err(StoreError::Invariant(format!(
                    "actor #{} placed in inactive room #{}",
                    player.actor_id, room_id
                )));
            }
        }
        data.players.insert(player.actor_id, player);
        Ok(())
    }

    /// Plain snapshots of the whole graph, for structural validation.
    pub fn graph_snapshot(
        &self,
    ) -> Result<(Vec<RoomSnap>, Vec<EntranceSnap>, Vec<ConnectionSnap>), StoreError> {
        let data = self.read()?;
        Ok((
            data.rooms.values().map(Room::snap).collect(),
            data.entrances.values().map(Entrance::snap).collect(),
            data.connections.values().map(Connection::snap).collect(),
        ))
    }

    /// (rooms, entrances, connections, players) on hand.
    pub fn counts(&self) -> Result<(usize, usize, usize, usize), StoreError> {
        let data = self.read()?;
        Ok((
            data.rooms.len(),
            data.entrances.len(),
            data.connections.len(),
            data.players.len(),
        ))
    }
}

impl RoomRepository for MemoryStore {
    fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self.read()?.rooms.get(&id).cloned())
    }
}

impl EntranceRepository for MemoryStore {
    fn entrance(&self, id: EntranceId) -> Result<Option<Entrance>, StoreError> {
        Ok(self.read()?.entrances.get(&id).cloned())
    }

    fn entrances_in_room(&self, room: RoomId) -> Result<Vec<Entrance>, StoreError> {
        Ok(self
            .read()?
            .entrances
            .values()
            .filter(|e| e.room_id == room)
            .cloned()
            .collect())
    }

    fn connection(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError> {
        Ok(self.read()?.connections.get(&id).cloned())
    }
}

impl PlayerRepository for MemoryStore {
    fn player(&self, actor: ActorId) -> Result<Option<PlayerState>, StoreError> {
        Ok(self.read()?.players.get(&actor).cloned())
    }
}

impl TransitionCommit for MemoryStore {
    fn commit_transition(
        &self,
        player: &PlayerState,
        entrance: &Entrance,
    ) -> Result<(), StoreError> {
        let mut data = self.write()?;
        let stored = data
            .players
            .get(&player.actor_id)
            .ok_or(StoreError::Missing {
                kind: "actor",
                id: player.actor_id,
            })?;
        if stored.version + 1 != player.version {
            return Err(StoreError::Conflict {
                actor: player.actor_id,
                expected: stored.version + 1,
            });
        }
        if !data.entrances.contains_key(&entrance.id) {
            return Err(StoreError::Missing {
                kind: "entrance",
                id: entrance.id,
            });
        }
        // Both rows verified; apply together under the one write lock.
        data.players.insert(player.actor_id, player.clone());
        data.entrances.insert(entrance.id, entrance.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_logic::access::access_levels;
    use warren_logic::constants::activity_states;

    fn make_room(id: RoomId, name: &str) -> Room {
        Room {
            id,
            name: name.to_string(),
            is_active: true,
            length: 10,
            width: 8,
            height: 3,
            owner: None,
        }
    }

    fn make_entrance(id: EntranceId, room: RoomId) -> Entrance {
        Entrance {
            id,
            room_id: room,
            face: facings::EAST,
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
            position_x: 10,
            position_y: 4,
            connection_id: None,
        }
    }

    fn make_connection(id: ConnectionId, from: RoomId, to: RoomId, entrance: EntranceId) -> Connection {
        Connection {
            id,
            from_room: from,
            to_room: to,
            entrance_id: entrance,
            bidirectional: true,
            energy_cost: 5,
        }
    }

    fn make_player(actor: ActorId, room: Option<RoomId>) -> PlayerState {
        PlayerState {
            actor_id: actor,
            access_tier: access_levels::RESIDENT,
            current_room: room,
            position_x: 0,
            position_y: 0,
            energy: 50,
            productivity: 0,
            social: 0,
            activity: activity_states::IDLE,
            version: 0,
        }
    }

    fn two_room_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_room(make_room(1, "Lobby")).unwrap();
        store.insert_room(make_room(2, "Studio")).unwrap();
        store.insert_entrance(make_entrance(10, 1)).unwrap();
        store
            .insert_connection(make_connection(100, 1, 2, 10))
            .unwrap();
        store
    }

    #[test]
    fn room_names_are_unique() {
        let store = MemoryStore::new();
        store.insert_room(make_room(1, "Lobby")).unwrap();
        let err = store.insert_room(make_room(2, "Lobby")).unwrap_err();
        assert!(matches!(err, StoreError::Invariant(_)));
    }

    #[test]
    fn entrances_need_an_existing_room() {
        let store = MemoryStore::new();
        let err = store.insert_entrance(make_entrance(10, 9)).unwrap_err();
        assert!(matches!(err, StoreError::Invariant(_)));
    }

    #[test]
    fn connections_anchor_in_their_origin_room() {
        let store = MemoryStore::new();
        store.insert_room(make_room(1, "Lobby")).unwrap();
        store.insert_room(make_room(2, "Studio")).unwrap();
        store.insert_entrance(make_entrance(10, 2)).unwrap();
        // Entrance 10 sits in room 2; the edge claims to start in room 1.
        let err = store
            .insert_connection(make_connection(100, 1, 2, 10))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invariant(_)));
    }

    #[test]
    fn wiring_links_the_entrance_back() {
        let store = two_room_store();
        let entrance = store.entrance(10).unwrap().unwrap();
        assert_eq!(entrance.connection_id, Some(100));
    }

    #[test]
    fn an_entrance_anchors_at_most_one_connection() {
        let store = two_room_store();
        let err = store
            .insert_connection(make_connection(101, 1, 2, 10))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invariant(_)));
    }

    #[test]
    fn parallel_edges_via_distinct_entrances_are_legal() {
        let store = MemoryStore::new();
        store.insert_room(make_room(1, "Lobby")).unwrap();
        store.insert_room(make_room(2, "Studio")).unwrap();
        store.insert_entrance(make_entrance(10, 1)).unwrap();
        store.insert_entrance(make_entrance(11, 1)).unwrap();
        store
            .insert_connection(make_connection(100, 1, 2, 10))
            .unwrap();
        // Repeating the triple would need entrance 10 again, which is
        // taken; a distinct entrance makes this a parallel edge.
        store
            .insert_connection(make_connection(101, 1, 2, 11))
            .unwrap();
        assert_eq!(store.counts().unwrap().2, 2);
    }

    #[test]
    fn players_must_start_in_an_active_room() {
        let store = MemoryStore::new();
        let mut closed = make_room(1, "Old Wing");
        closed.is_active = false;
        store.insert_room(closed).unwrap();

        let err = store.insert_player(make_player(7, Some(1))).unwrap_err();
        assert!(matches!(err, StoreError::Invariant(_)));

        store.insert_player(make_player(7, None)).unwrap();
    }

    #[test]
    fn entrances_in_room_filters_by_room() {
        let store = MemoryStore::new();
        store.insert_room(make_room(1, "Lobby")).unwrap();
        store.insert_room(make_room(2, "Studio")).unwrap();
        store.insert_entrance(make_entrance(10, 1)).unwrap();
        store.insert_entrance(make_entrance(11, 1)).unwrap();
        store.insert_entrance(make_entrance(12, 2)).unwrap();

        let in_lobby = store.entrances_in_room(1).unwrap();
        assert_eq!(in_lobby.len(), 2);
        assert!(in_lobby.iter().all(|e| e.room_id == 1));
    }

    #[test]
    fn commit_requires_the_next_version() {
        let store = two_room_store();
        store.insert_player(make_player(7, Some(1))).unwrap();

        let mut player = store.player(7).unwrap().unwrap();
        let entrance = store.entrance(10).unwrap().unwrap();

        // Stale write: version not bumped.
        let err = store.commit_transition(&player, &entrance).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        player.version += 1;
        player.current_room = Some(2);
        player.energy -= 5;
        store.commit_transition(&player, &entrance).unwrap();

        let stored = store.player(7).unwrap().unwrap();
        assert_eq!(stored.current_room, Some(2));
        assert_eq!(stored.energy, 45);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn commit_persists_both_records() {
        let store = two_room_store();
        store.insert_player(make_player(7, Some(1))).unwrap();

        let mut player = store.player(7).unwrap().unwrap();
        player.version += 1;
        let mut entrance = store.entrance(10).unwrap().unwrap();
        entrance.usage_count += 1;
        entrance.last_opened = Some(1_700_000_000);
        entrance.recent_uses.push(1_700_000_000);

        store.commit_transition(&player, &entrance).unwrap();

        let stored = store.entrance(10).unwrap().unwrap();
        assert_eq!(stored.usage_count, 1);
        assert_eq!(stored.last_opened, Some(1_700_000_000));
        assert_eq!(stored.recent_uses, vec![1_700_000_000]);
    }
}
