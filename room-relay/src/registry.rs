//! In-memory store of live rooms and their message histories.
//!
//! The registry knows nothing about connections. It is driven by the
//! membership manager (which decides when rooms come and go) and by the
//! dispatcher (the only caller allowed to append to a history).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::message::Message;

/// A named room with its append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    id: String,
    messages: Vec<Message>,
}

impl Room {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Mapping from room id to [`Room`].
///
/// A `BTreeMap` keeps [`RoomRegistry::list_all`] in a stable, id-sorted order.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: BTreeMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room with `id`, creating an empty one if it does not exist.
    ///
    /// An existing room is reused as-is; its history is never reset.
    pub fn get_or_create(&mut self, id: &str) -> &Room {
        self.rooms
            .entry(id.to_string())
            .or_insert_with(|| Room::new(id))
    }

    pub fn find(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    /// Appends `message` to the room's history. Returns `false` if the room
    /// does not exist.
    pub fn append(&mut self, id: &str, message: Message) -> bool {
        match self.rooms.get_mut(id) {
            Some(room) => {
                room.messages.push(message);
                true
            }
            None => false,
        }
    }

    /// Removes the room and its history. Returns whether a room was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        self.rooms.remove(id).is_some()
    }

    /// Snapshot of every live room, ordered by id.
    pub fn list_all(&self) -> Vec<Room> {
        self.rooms.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
