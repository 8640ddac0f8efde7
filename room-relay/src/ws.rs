use axum::{
    extract::{
        State,
        ws::{Message as Frame, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{select, sync::mpsc};
use tracing::{debug, info, warn};

use crate::{
    membership::ConnectionId,
    message::{ServerEvent, decode_client_event, encode_server_event},
    relay::Relay,
};

pub async fn room_socket(ws: WebSocketUpgrade, State(relay): State<Relay>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, relay))
}

/// Runs one client session until the socket closes or the relay shuts down,
/// then leaves every room the client had joined.
pub async fn serve_socket(socket: WebSocket, relay: Relay) {
    let (connection, inbox) = relay.connect().await;
    info!(connection, "client connected");

    let (sender, receiver) = socket.split();
    let mut forward_task = tokio::spawn(forward_outbox(inbox, sender, connection));

    select! {
        _ = read_frames(receiver, &relay, connection) => {}
        _ = &mut forward_task => {}
    }

    let closed = relay.disconnect(connection).await;
    forward_task.abort();
    info!(connection, closed_rooms = closed.len(), "client disconnected");
}

async fn forward_outbox(
    mut inbox: mpsc::Receiver<ServerEvent>,
    mut sender: SplitSink<WebSocket, Frame>,
    connection: ConnectionId,
) {
    while let Some(event) = inbox.recv().await {
        let text = match encode_server_event(&event) {
            Ok(text) => text,
            Err(error) => {
                warn!(connection, ?error, "failed to encode server event");
                continue;
            }
        };
        if let Err(error) = sender.send(Frame::Text(text)).await {
            debug!(connection, ?error, "failed to deliver event to client");
            break;
        }
    }
    // Best effort; the peer may already be gone.
    let _ = sender.send(Frame::Close(None)).await;
}

async fn read_frames(mut receiver: SplitStream<WebSocket>, relay: &Relay, connection: ConnectionId) {
    while let Some(frame) = receiver.next().await {
        let payload = match frame {
            Ok(Frame::Text(text)) => text.into_bytes(),
            Ok(Frame::Binary(bytes)) => bytes,
            Ok(Frame::Close(_)) => break,
            Ok(Frame::Ping(_) | Frame::Pong(_)) => continue,
            Err(error) => {
                debug!(connection, ?error, "websocket read failed");
                break;
            }
        };

        match decode_client_event(&payload) {
            Ok(event) => {
                debug!(connection, ?event, "client event");
                relay.handle(connection, event).await;
            }
            Err(error) => {
                debug!(connection, %error, "rejected malformed frame");
                relay
                    .notify(
                        connection,
                        ServerEvent::Error {
                            message: format!("invalid event: {error}"),
                        },
                    )
                    .await;
            }
        }
    }
}
