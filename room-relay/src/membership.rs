//! Which connections are in which rooms.
//!
//! Membership is the only thing that decides a room's lifetime: a room is
//! created by the first create/join and evicted from the [`RoomRegistry`]
//! when the last distinct connection leaves it.

use std::collections::{BTreeSet, HashMap, HashSet};

use nanoid::nanoid;
use tracing::debug;

use crate::registry::{Room, RoomRegistry};

pub type ConnectionId = u64;

/// What a `leave` did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The connection was not in the room; nothing changed.
    NotMember,
    /// The connection left and this many members remain.
    Remaining(usize),
    /// The connection was the last member and the room was deleted.
    Evicted,
}

#[derive(Debug, Default)]
pub struct Membership {
    by_room: HashMap<String, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, BTreeSet<String>>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or reuses) a room and makes `connection` a member.
    ///
    /// An absent or empty `requested` id gets a generated one that does not
    /// collide with any live room.
    pub fn create(
        &mut self,
        registry: &mut RoomRegistry,
        connection: ConnectionId,
        requested: Option<&str>,
    ) -> Room {
        let id = match requested.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => generate_room_id(registry),
        };
        self.join(registry, connection, &id)
    }

    /// Joins `room_id`, creating the room if needed, and returns a snapshot of
    /// it including the current history.
    pub fn join(
        &mut self,
        registry: &mut RoomRegistry,
        connection: ConnectionId,
        room_id: &str,
    ) -> Room {
        let room = registry.get_or_create(room_id).clone();
        self.insert(connection, room_id);
        debug!(
            connection,
            room = room_id,
            members = self.member_count(room_id),
            "joined room"
        );
        room
    }

    /// Removes `connection` from `room_id` and evicts the room once nobody is
    /// left in it.
    pub fn leave(
        &mut self,
        registry: &mut RoomRegistry,
        connection: ConnectionId,
        room_id: &str,
    ) -> Departure {
        let was_member = self.remove(connection, room_id);
        let remaining = self.member_count(room_id);

        if remaining == 0 && registry.delete(room_id) {
            debug!(connection, room = room_id, "evicted empty room");
            return Departure::Evicted;
        }

        if was_member {
            Departure::Remaining(remaining)
        } else {
            Departure::NotMember
        }
    }

    /// Leaves every room `connection` is in. Returns the rooms that were
    /// evicted as a result.
    pub fn leave_all(
        &mut self,
        registry: &mut RoomRegistry,
        connection: ConnectionId,
    ) -> Vec<String> {
        let mut evicted = Vec::new();
        for room_id in self.rooms_of(connection) {
            if self.leave(registry, connection, &room_id) == Departure::Evicted {
                evicted.push(room_id);
            }
        }
        evicted
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.by_room.get(room_id).map_or(0, HashSet::len)
    }

    #[cfg(test)]
    fn is_member(&self, connection: ConnectionId, room_id: &str) -> bool {
        self.by_room
            .get(room_id)
            .is_some_and(|members| members.contains(&connection))
    }

    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<String> {
        self.by_connection
            .get(&connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, connection: ConnectionId, room_id: &str) {
        self.by_room
            .entry(room_id.to_string())
            .or_default()
            .insert(connection);
        self.by_connection
            .entry(connection)
            .or_default()
            .insert(room_id.to_string());
    }

    fn remove(&mut self, connection: ConnectionId, room_id: &str) -> bool {
        let removed = match self.by_room.get_mut(room_id) {
            Some(members) => {
                let removed = members.remove(&connection);
                if members.is_empty() {
                    self.by_room.remove(room_id);
                }
                removed
            }
            None => false,
        };

        if let Some(rooms) = self.by_connection.get_mut(&connection) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                self.by_connection.remove(&connection);
            }
        }

        removed
    }
}

fn generate_room_id(registry: &RoomRegistry) -> String {
    loop {
        let id = nanoid!();
        if !registry.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn create_with_requested_id_uses_it() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        let room = membership.create(&mut registry, 1, Some("abc"));
        assert_eq!(room.id(), "abc");
        assert!(room.messages().is_empty());
        assert!(registry.find("abc").is_some());
        assert_eq!(membership.member_count("abc"), 1);
    }

    #[test]
    fn create_without_id_generates_distinct_ids() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        let first = membership.create(&mut registry, 1, None);
        let second = membership.create(&mut registry, 1, Some(""));
        assert!(!first.id().is_empty());
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.len(), 2);
        assert_eq!(membership.rooms_of(1).len(), 2);
    }

    #[test]
    fn join_creates_missing_room_and_keeps_existing_history() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        let room = membership.join(&mut registry, 1, "abc");
        assert!(room.messages().is_empty());

        registry.append("abc", Message::new("a", "hi"));
        let room = membership.join(&mut registry, 2, "abc");
        assert_eq!(room.messages(), &[Message::new("a", "hi")]);
        assert_eq!(membership.member_count("abc"), 2);
    }

    #[test]
    fn joining_twice_counts_one_member() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        membership.join(&mut registry, 1, "abc");
        membership.join(&mut registry, 1, "abc");
        assert_eq!(membership.member_count("abc"), 1);

        assert_eq!(
            membership.leave(&mut registry, 1, "abc"),
            Departure::Evicted
        );
    }

    #[test]
    fn last_leave_evicts_room() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        membership.create(&mut registry, 1, Some("abc"));
        membership.join(&mut registry, 2, "abc");

        assert_eq!(
            membership.leave(&mut registry, 1, "abc"),
            Departure::Remaining(1)
        );
        assert!(registry.find("abc").is_some());

        assert_eq!(
            membership.leave(&mut registry, 2, "abc"),
            Departure::Evicted
        );
        assert!(registry.find("abc").is_none());
        assert!(membership.rooms_of(2).is_empty());
    }

    #[test]
    fn leaving_a_room_you_are_not_in_changes_nothing() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        membership.join(&mut registry, 1, "abc");
        assert_eq!(
            membership.leave(&mut registry, 2, "abc"),
            Departure::NotMember
        );
        assert_eq!(
            membership.leave(&mut registry, 2, "ghost"),
            Departure::NotMember
        );
        assert_eq!(membership.member_count("abc"), 1);
        assert!(registry.find("abc").is_some());
    }

    #[test]
    fn leave_all_only_evicts_rooms_left_empty() {
        let mut registry = RoomRegistry::new();
        let mut membership = Membership::new();

        membership.join(&mut registry, 1, "solo");
        membership.join(&mut registry, 1, "shared");
        membership.join(&mut registry, 2, "shared");

        let evicted = membership.leave_all(&mut registry, 1);
        assert_eq!(evicted, ["solo"]);
        assert!(registry.find("solo").is_none());
        assert!(registry.find("shared").is_some());
        assert!(!membership.is_member(1, "shared"));
        assert!(membership.is_member(2, "shared"));
    }
}
