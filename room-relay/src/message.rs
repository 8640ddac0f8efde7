use serde::{Deserialize, Serialize};

/// A chat message as submitted by a client. The relay never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub user: String,
    pub content: String,
}

impl Message {
    pub fn new(user: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    CreateRoom {
        #[serde(default)]
        room: Option<String>,
    },
    JoinRoom {
        room: String,
    },
    LeaveRoom {
        room: String,
    },
    SendMessage {
        room: String,
        message: Message,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    JoinedRoom { room: String, messages: Vec<Message> },
    LeftRoom,
    ReceiveMessage { message: Message },
    Error { message: String },
}

pub fn decode_client_event(frame: &[u8]) -> serde_json::Result<ClientEvent> {
    serde_json::from_slice(frame)
}

pub fn encode_server_event(event: &ServerEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}
