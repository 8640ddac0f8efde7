use tracing::debug;

use crate::{
    gateway::Gateway,
    message::{Message, ServerEvent},
    registry::RoomRegistry,
};

/// Records `message` in the room's history (when the room exists) and fans it
/// out to the room's gateway group.
///
/// Delivery happens even when there is no room record, so a group without a
/// room still receives the message. Returns whether the history was updated.
pub fn send(
    registry: &mut RoomRegistry,
    gateway: &Gateway,
    room_id: &str,
    message: Message,
) -> bool {
    let recorded = registry.append(room_id, message.clone());
    let delivered = gateway.broadcast(room_id, &ServerEvent::ReceiveMessage { message });
    debug!(room = room_id, recorded, delivered, "dispatched message");
    recorded
}
