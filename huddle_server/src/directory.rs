//! Room membership
//!
//! Rooms exist only while they have members: the first `join` creates one and
//! the `leave` that empties it removes it again. A reverse index from client to
//! rooms keeps `leave_all` proportional to the client's own memberships.

use huddle_protocol::{ClientId, RoomId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Default)]
struct Room {
    members: HashSet<ClientId>,
}

#[derive(Debug, Default)]
struct InnerDirectory {
    rooms: HashMap<RoomId, Room>,
    /// Client -> rooms it belongs to; mirrors `rooms`
    memberships: HashMap<ClientId, HashSet<RoomId>>,
}

impl InnerDirectory {
    fn remove_member(&mut self, room_id: &RoomId, client_id: &ClientId) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if !room.members.remove(client_id) {
            return false;
        }
        if room.members.is_empty() {
            self.rooms.remove(room_id);
            debug!(room = %room_id, "room dissolved");
        }
        true
    }
}

/// Maps room ids to their member clients
#[derive(Debug, Default)]
pub struct RoomDirectory {
    inner: Mutex<InnerDirectory>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `client_id` to the room, creating the room if needed.
    ///
    /// Returns `false` if the client was already a member.
    pub fn join(&self, room_id: &RoomId, client_id: &ClientId) -> bool {
        let mut inner = self.inner.lock();
        let added = inner
            .rooms
            .entry(room_id.clone())
            .or_default()
            .members
            .insert(client_id.clone());
        if added {
            inner
                .memberships
                .entry(client_id.clone())
                .or_default()
                .insert(room_id.clone());
        }
        added
    }

    /// Remove `client_id` from the room, dissolving the room once empty.
    ///
    /// Returns `false` if there was no such membership.
    pub fn leave(&self, room_id: &RoomId, client_id: &ClientId) -> bool {
        let mut inner = self.inner.lock();
        if !inner.remove_member(room_id, client_id) {
            return false;
        }
        if let Some(rooms) = inner.memberships.get_mut(client_id) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                inner.memberships.remove(client_id);
            }
        }
        true
    }

    /// Remove `client_id` from every room; returns the rooms it left
    pub fn leave_all(&self, client_id: &ClientId) -> Vec<RoomId> {
        let mut inner = self.inner.lock();
        let Some(rooms) = inner.memberships.remove(client_id) else {
            return Vec::new();
        };
        rooms
            .into_iter()
            .filter(|room_id| inner.remove_member(room_id, client_id))
            .collect()
    }

    /// Snapshot of the room's members; empty if the room does not exist
    pub fn members_of(&self, room_id: &RoomId) -> HashSet<ClientId> {
        self.inner
            .lock()
            .rooms
            .get(room_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, client_id: &ClientId) -> HashSet<RoomId> {
        self.inner
            .lock()
            .memberships
            .get(client_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.inner.lock().rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn room(id: &str) -> RoomId {
        RoomId::from(id)
    }

    fn client(id: &str) -> ClientId {
        ClientId::from(id)
    }

    #[test]
    fn test_join_then_leave() {
        let directory = RoomDirectory::new();
        assert!(directory.join(&room("r1"), &client("c1")));
        assert!(directory.members_of(&room("r1")).contains(&client("c1")));

        assert!(directory.leave(&room("r1"), &client("c1")));
        assert!(!directory.members_of(&room("r1")).contains(&client("c1")));
        assert!(!directory.contains_room(&room("r1")));
        assert!(directory.members_of(&room("r1")).is_empty());

        // Second leave is a no-op
        assert!(!directory.leave(&room("r1"), &client("c1")));
        assert_eq!(directory.room_count(), 0);
    }

    #[test]
    fn test_join_is_idempotent() {
        let directory = RoomDirectory::new();
        assert!(directory.join(&room("r1"), &client("c1")));
        assert!(!directory.join(&room("r1"), &client("c1")));
        assert_eq!(directory.members_of(&room("r1")).len(), 1);
    }

    #[test]
    fn test_room_survives_until_last_member_leaves() {
        let directory = RoomDirectory::new();
        directory.join(&room("r1"), &client("c1"));
        directory.join(&room("r1"), &client("c2"));

        directory.leave(&room("r1"), &client("c1"));
        assert!(directory.contains_room(&room("r1")));
        assert_eq!(
            directory.members_of(&room("r1")),
            HashSet::from([client("c2")])
        );

        directory.leave(&room("r1"), &client("c2"));
        assert!(!directory.contains_room(&room("r1")));
    }

    #[test]
    fn test_leave_unknown_room_or_member() {
        let directory = RoomDirectory::new();
        assert!(!directory.leave(&room("ghost"), &client("c1")));

        directory.join(&room("r1"), &client("c1"));
        assert!(!directory.leave(&room("r1"), &client("c2")));
        assert!(directory.contains_room(&room("r1")));
    }

    #[test]
    fn test_leave_all_clears_every_room() {
        let directory = RoomDirectory::new();
        directory.join(&room("A"), &client("c1"));
        directory.join(&room("B"), &client("c1"));
        directory.join(&room("B"), &client("c2"));

        let mut left = directory.leave_all(&client("c1"));
        left.sort();
        assert_eq!(left, vec![room("A"), room("B")]);

        assert!(directory.members_of(&room("A")).is_empty());
        assert!(!directory.members_of(&room("B")).contains(&client("c1")));
        assert!(!directory.contains_room(&room("A")));
        assert!(directory.contains_room(&room("B")));
        assert!(directory.rooms_of(&client("c1")).is_empty());

        assert!(directory.leave_all(&client("c1")).is_empty());
    }

    #[test]
    fn test_rooms_of_tracks_memberships() {
        let directory = RoomDirectory::new();
        directory.join(&room("A"), &client("c1"));
        directory.join(&room("B"), &client("c1"));
        directory.leave(&room("A"), &client("c1"));
        assert_eq!(directory.rooms_of(&client("c1")), HashSet::from([room("B")]));
    }

    #[test]
    fn test_concurrent_joins_converge() {
        let directory = Arc::new(RoomDirectory::new());
        let handles: Vec<_> = (0..100)
            .map(|i| {
                let directory = Arc::clone(&directory);
                std::thread::spawn(move || {
                    directory.join(&RoomId::from("busy"), &ClientId(format!("client-{i}")))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let members = directory.members_of(&room("busy"));
        assert_eq!(members.len(), 100);
        for i in 0..100 {
            assert!(members.contains(&ClientId(format!("client-{i}"))));
        }
    }
}
