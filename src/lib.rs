// Event types and listener callbacks
pub mod event;

// Wire protocol (addListener / event messages)
pub mod protocol;

// Listener registry and dispatch
pub mod registry;

// Connection gate
pub mod gate;

// Transport sessions (WebSocket)
pub mod transport;

// Connection supervisor (reconnect + replay)
pub mod supervisor;

// Public subscription API
pub mod client;

// Configuration loading
pub mod config;

pub use client::{ClientError, ObservationClient};
pub use event::{EventType, EventTypes, Listener, SubscriptionId};
pub use protocol::ListenerId;
