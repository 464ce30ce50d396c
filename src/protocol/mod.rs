use crate::event::EventType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[cfg(test)]
mod tests;

/// Identifier the server echoes back with every event for a listener.
///
/// Allocated by the registry, one per registration message ever sent.
/// Never reused, including across reconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client → Server message types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "addListener")]
    AddListener(AddListener),
}

/// Payload of an `addListener` message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddListener {
    pub event_type: EventType,
    pub event_data: ListenerData,
}

/// Data the server attaches to every event it sends for this listener
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerData {
    pub data: Value,
    pub listener_id: ListenerId,
}

impl ClientMessage {
    pub fn add_listener(listener_id: ListenerId, event_type: EventType, data: Value) -> Self {
        ClientMessage::AddListener(AddListener {
            event_type,
            event_data: ListenerData { data, listener_id },
        })
    }

    /// Encode as a text frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Server → Client message types
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Event(EventMessage),
    /// Any other (or missing) `type`; ignored by the client
    Other(Option<String>),
}

/// Server → Client: a server-side event for one listener.
///
/// Fields missing from the payload decode to `Value::Null`. A missing or
/// non-integer `listenerId` decodes to `None`, which never matches a
/// registered listener.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMessage {
    pub listener_id: Option<ListenerId>,
    pub event: Value,
    pub source: Value,
    pub source_data: Value,
    pub listener_data: Value,
}

impl EventMessage {
    /// Extract from the `data` member of an event message
    fn from_data(data: Option<&Value>) -> Self {
        let field = |name: &str| {
            data.and_then(|d| d.get(name))
                .cloned()
                .unwrap_or(Value::Null)
        };
        let event_data = data.and_then(|d| d.get("eventData"));

        Self {
            listener_id: event_data
                .and_then(|e| e.get("listenerId"))
                .and_then(Value::as_u64)
                .map(ListenerId),
            event: field("event"),
            source: field("source"),
            source_data: field("data"),
            listener_data: event_data
                .and_then(|e| e.get("data"))
                .cloned()
                .unwrap_or(Value::Null),
        }
    }
}

/// Inbound decode errors
#[derive(Debug)]
pub enum DecodeError {
    /// The frame is not valid JSON
    Malformed(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "malformed message: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Malformed(e) => Some(e),
        }
    }
}

/// Decode one inbound text frame.
///
/// Only invalid JSON is an error. Any JSON value whose `type` is not
/// `"event"` (including non-objects) decodes to `ServerMessage::Other`.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, DecodeError> {
    let message: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;

    match message.get("type").and_then(Value::as_str) {
        Some("event") => Ok(ServerMessage::Event(EventMessage::from_data(
            message.get("data"),
        ))),
        other => Ok(ServerMessage::Other(other.map(str::to_string))),
    }
}
