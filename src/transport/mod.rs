// Transport sessions: one live connection attempt each

pub mod websocket;

pub use websocket::WebSocketConnector;

use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one connection attempt. Increases with every attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What happened on a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    Opened,
    /// One inbound text frame, undecoded
    Message(String),
    Closed { code: u16, reason: String },
    Error(String),
}

/// Session callback delivered to the supervisor
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub kind: SessionEventKind,
}

/// Sender half the transport reports session events on
pub type SessionEvents = mpsc::UnboundedSender<SessionEvent>;

/// Outbound frames queued for a session
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    /// Send a normal close frame and end the session
    Close,
}

/// The session's outbound queue is gone (the session task ended)
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClosed(pub SessionId);

impl fmt::Display for SessionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is closed", self.0)
    }
}

impl std::error::Error for SessionClosed {}

/// Owning handle for one transport session.
///
/// Dropping the handle aborts the session task. `close` ends it with a
/// normal close frame instead.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    outbound: mpsc::UnboundedSender<Outbound>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn new(
        id: SessionId,
        outbound: mpsc::UnboundedSender<Outbound>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self { id, outbound, task }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a text frame; never blocks
    pub fn send(&self, text: String) -> Result<(), SessionClosed> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| SessionClosed(self.id))
    }

    /// Close gracefully and let the session task finish on its own
    pub fn close(mut self) {
        let _ = self.outbound.send(Outbound::Close);
        self.task.take();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opens transport sessions against a fixed endpoint.
///
/// An implementation reports, for the given session id, `Opened` once the
/// connection is up, then every inbound text frame as `Message`, and
/// `Closed` and/or `Error` when the session ends (including a failed
/// attempt that never opened). Events after the handle is dropped are
/// optional.
///
/// Liveness probing (ping/pong keep-alive) is not part of this contract;
/// only an explicit close or error ends a session.
pub trait Connector: Send + 'static {
    fn connect(&mut self, session: SessionId, events: SessionEvents) -> SessionHandle;
}
