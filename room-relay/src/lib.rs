//! Room-based message relay.
//!
//! Clients open a WebSocket, create or join named rooms, and every message
//! sent to a room is appended to its history and broadcast to the room's
//! members. Joiners get the history replayed. A room lives only while at
//! least one connection is in it. See `README.md` for the wire protocol.
//!
//! - [`registry`] stores live rooms and their append-only histories.
//! - [`membership`] tracks which connections are in which room and decides
//!   when rooms are created and evicted.
//! - [`dispatch`] records a message and fans it out to a room's group.
//! - [`gateway`] owns per-connection outboxes and the transport groups.
//! - [`relay`] puts the above behind one lock and is the handle everything
//!   else shares.
//! - [`ws`] runs a WebSocket session against the relay.
//! - [`api`] exposes the HTTP listings and the upgrade route.
//! - [`server`] and [`cli`] handle the listener lifecycle and configuration.

pub mod api;
pub mod cli;
pub mod dispatch;
pub mod gateway;
pub mod membership;
pub mod message;
pub mod registry;
pub mod relay;
pub mod server;
pub mod ws;
