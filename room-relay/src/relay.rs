use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::{
    dispatch,
    gateway::Gateway,
    membership::{ConnectionId, Departure, Membership},
    message::{ClientEvent, Message, ServerEvent},
    registry::{Room, RoomRegistry},
};

pub const DEFAULT_OUTBOX_CAPACITY: usize = 128;

/// Shared handle to the relay core.
///
/// Registry, membership and gateway tables sit behind a single lock, so each
/// event is applied as one atomic step relative to every other event.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    state: Mutex<RelayState>,
    next_id: AtomicU64,
    outbox_capacity: usize,
}

#[derive(Default)]
struct RelayState {
    registry: RoomRegistry,
    membership: Membership,
    gateway: Gateway,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl Relay {
    pub fn new(outbox_capacity: usize) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                state: Mutex::new(RelayState::default()),
                next_id: AtomicU64::new(1),
                outbox_capacity: outbox_capacity.max(1),
            }),
        }
    }

    /// Registers a new connection and returns its id together with the
    /// receiving end of its outbox.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let connection = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (outbox, inbox) = mpsc::channel(self.inner.outbox_capacity);
        self.inner
            .state
            .lock()
            .await
            .gateway
            .connect(connection, outbox);
        (connection, inbox)
    }

    /// Applies one client event and queues the reply, if any, for the sender.
    pub async fn handle(&self, connection: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom { room } => {
                self.create_room(connection, room.as_deref()).await;
            }
            ClientEvent::JoinRoom { room } => {
                self.join_room(connection, &room).await;
            }
            ClientEvent::LeaveRoom { room } => {
                self.leave_room(connection, &room).await;
            }
            ClientEvent::SendMessage { room, message } => {
                self.send_message(&room, message).await;
            }
        }
    }

    /// Creates (or reuses) a room for `connection`. The sender's
    /// `joined-room` reply always carries an empty history; the returned
    /// snapshot is the room as stored.
    pub async fn create_room(&self, connection: ConnectionId, requested: Option<&str>) -> Room {
        let mut state = self.inner.state.lock().await;
        let RelayState {
            registry,
            membership,
            gateway,
        } = &mut *state;

        let room = membership.create(registry, connection, requested);
        gateway.join(connection, room.id());
        // A reused room is announced with an empty history, same as a new one.
        gateway.emit(
            connection,
            ServerEvent::JoinedRoom {
                room: room.id().to_string(),
                messages: Vec::new(),
            },
        );
        info!(connection, room = room.id(), "room created");
        room
    }

    pub async fn join_room(&self, connection: ConnectionId, room_id: &str) -> Room {
        let mut state = self.inner.state.lock().await;
        let RelayState {
            registry,
            membership,
            gateway,
        } = &mut *state;

        let room = membership.join(registry, connection, room_id);
        gateway.join(connection, room_id);
        gateway.emit(connection, joined(&room));
        room
    }

    pub async fn leave_room(&self, connection: ConnectionId, room_id: &str) -> Departure {
        let mut state = self.inner.state.lock().await;
        let RelayState {
            registry,
            membership,
            gateway,
        } = &mut *state;

        let departure = membership.leave(registry, connection, room_id);
        gateway.leave(connection, room_id);
        gateway.emit(connection, ServerEvent::LeftRoom);
        if departure == Departure::Evicted {
            info!(room = room_id, "room closed");
        }
        departure
    }

    /// Returns whether the message was recorded in a room's history.
    pub async fn send_message(&self, room_id: &str, message: Message) -> bool {
        let mut state = self.inner.state.lock().await;
        let RelayState {
            registry, gateway, ..
        } = &mut *state;
        dispatch::send(registry, gateway, room_id, message)
    }

    /// Leaves every room the connection joined and forgets its outbox.
    /// Returns the rooms that closed because of it.
    pub async fn disconnect(&self, connection: ConnectionId) -> Vec<String> {
        let mut state = self.inner.state.lock().await;
        let RelayState {
            registry,
            membership,
            gateway,
        } = &mut *state;

        let closed = membership.leave_all(registry, connection);
        gateway.disconnect(connection);
        for room in &closed {
            info!(room = %room, "room closed");
        }
        closed
    }

    /// Queues an event for one connection outside the normal request flow.
    pub async fn notify(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        self.inner.state.lock().await.gateway.emit(connection, event)
    }

    /// Tells every connected client the relay is going away and closes their
    /// outboxes.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        debug!(
            connections = state.gateway.connection_count(),
            "closing client outboxes"
        );
        state.gateway.close_all(&ServerEvent::Error {
            message: "relay shutting down".to_string(),
        });
    }

    pub async fn rooms(&self) -> Vec<Room> {
        self.inner.state.lock().await.registry.list_all()
    }

    pub async fn room(&self, room_id: &str) -> Option<Room> {
        self.inner.state.lock().await.registry.find(room_id).cloned()
    }

    pub async fn member_count(&self, room_id: &str) -> usize {
        self.inner
            .state
            .lock()
            .await
            .membership
            .member_count(room_id)
    }
}

fn joined(room: &Room) -> ServerEvent {
    ServerEvent::JoinedRoom {
        room: room.id().to_string(),
        messages: room.messages().to_vec(),
    }
}
