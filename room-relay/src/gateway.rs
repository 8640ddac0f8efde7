//! Transport-side bookkeeping: one outbox per connection and the gateway
//! groups used for fan-out.
//!
//! Groups mirror what a socket has subscribed to and are kept separately
//! from [`Membership`](crate::membership::Membership); room lifetime is never
//! decided from here.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::{membership::ConnectionId, message::ServerEvent};

pub type Outbox = mpsc::Sender<ServerEvent>;

#[derive(Debug, Default)]
pub struct Gateway {
    outboxes: HashMap<ConnectionId, Outbox>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, connection: ConnectionId, outbox: Outbox) {
        self.outboxes.insert(connection, outbox);
    }

    /// Forgets the connection's outbox and drops it from every group.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        self.outboxes.remove(&connection);
        self.groups.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }

    pub fn join(&mut self, connection: ConnectionId, room_id: &str) {
        self.groups
            .entry(room_id.to_string())
            .or_default()
            .insert(connection);
    }

    pub fn leave(&mut self, connection: ConnectionId, room_id: &str) {
        if let Some(members) = self.groups.get_mut(room_id) {
            members.remove(&connection);
            if members.is_empty() {
                self.groups.remove(room_id);
            }
        }
    }

    #[cfg(test)]
    fn group_size(&self, room_id: &str) -> usize {
        self.groups.get(room_id).map_or(0, HashSet::len)
    }

    pub fn connection_count(&self) -> usize {
        self.outboxes.len()
    }

    /// Queues `event` for a single connection. Returns whether it was queued.
    pub fn emit(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        match self.outboxes.get(&connection) {
            Some(outbox) => deliver(connection, outbox, event),
            None => {
                debug!(connection, "no outbox for connection");
                false
            }
        }
    }

    /// Queues `event` for every connection in the room's group and returns how
    /// many outboxes accepted it. A missing group is an empty group.
    pub fn broadcast(&self, room_id: &str, event: &ServerEvent) -> usize {
        let Some(members) = self.groups.get(room_id) else {
            return 0;
        };

        let mut delivered = 0;
        for connection in members {
            if let Some(outbox) = self.outboxes.get(connection) {
                if deliver(*connection, outbox, event.clone()) {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Sends `event` to every connection and closes all outboxes.
    pub fn close_all(&mut self, event: &ServerEvent) {
        for (connection, outbox) in self.outboxes.drain() {
            deliver(connection, &outbox, event.clone());
        }
        self.groups.clear();
    }
}

fn deliver(connection: ConnectionId, outbox: &Outbox, event: ServerEvent) -> bool {
    match outbox.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(connection, "outbox full; dropping event for slow client");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(connection, "outbox closed");
            false
        }
    }
}
