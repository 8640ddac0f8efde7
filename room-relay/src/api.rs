//! HTTP surface: read-only room listings plus the WebSocket upgrade route.
//!
//! - `GET /rooms` lists every live room with its history.
//! - `GET /messages/:room` returns one room's history.
//! - `GET /ws` upgrades to a relay session (see [`crate::ws`]).
//!
//! Errors are returned as `{"message": "..."}` with the matching status code.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{message::Message, registry::Room, relay::Relay, ws};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No rooms exist")]
    NoRooms,
    #[error("This room does not exist")]
    RoomNotFound,
    #[error("Route does not exist")]
    RouteNotFound,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (StatusCode::NOT_FOUND, Json(body)).into_response()
    }
}

pub fn router(relay: Relay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/messages/:room", get(room_messages))
        .route("/ws", get(ws::room_socket))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(relay)
}

async fn list_rooms(State(relay): State<Relay>) -> Result<Json<Vec<Room>>, ApiError> {
    let rooms = relay.rooms().await;
    if rooms.is_empty() {
        return Err(ApiError::NoRooms);
    }
    Ok(Json(rooms))
}

async fn room_messages(
    State(relay): State<Relay>,
    Path(room): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    relay
        .room(&room)
        .await
        .map(|room| Json(room.into_messages()))
        .ok_or(ApiError::RoomNotFound)
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
