use crate::event::SubscriptionId;
use crate::gate::ConnectionGate;
use crate::protocol::{decode_server_message, ClientMessage, ServerMessage};
use crate::registry::{ListenerRegistry, SubscriptionRecord};
use crate::transport::{Connector, SessionEvent, SessionEventKind, SessionHandle, SessionId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};


/// Requests from `ObservationClient` handles
#[derive(Debug)]
pub enum Command {
    Subscribe(Vec<SubscriptionRecord>),
    Unsubscribe(SubscriptionId),
    Shutdown,
}

/// Owns the connection to the observation endpoint and keeps it alive.
///
/// Runs as a single task: every change to the registry, the gate and the
/// reconnect timer happens inside `run`, one event at a time.
///
/// # Lifecycle
/// 1. `connect` opens a session; `Opened` resolves the gate and flushes
///    queued subscriptions as `addListener` messages
/// 2. Inbound `event` messages are dispatched through the registry
/// 3. `Closed` or `Error` invalidates the gate and (re-)arms the reconnect
///    timer, so a burst of loss signals yields a single reconnect
/// 4. When the timer fires: `connect` again, drain the registry and queue
///    every record behind the gate, so it is registered under a fresh
///    listener id once the new session opens
pub struct Supervisor<C: Connector> {
    connector: C,
    reconnect_delay: Duration,
    registry: ListenerRegistry,
    gate: ConnectionGate<SessionHandle, SubscriptionRecord>,
    /// Attempt that has not opened yet
    connecting: Option<SessionHandle>,
    /// Latest session id handed to the connector
    current: Option<SessionId>,
    next_session: u64,
    /// Pending reconnect deadline (at most one)
    reconnect_at: Option<Instant>,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(
        connector: C,
        reconnect_delay: Duration,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            connector,
            reconnect_delay,
            registry: ListenerRegistry::new(),
            gate: ConnectionGate::new(),
            connecting: None,
            current: None,
            next_session: 0,
            reconnect_at: None,
            commands,
            events_tx,
            events_rx,
        }
    }

    /// Run until shutdown is requested or every client handle is dropped
    pub async fn run(mut self) {
        self.connect();

        loop {
            let reconnect_at = self.reconnect_at;

            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Subscribe(records)) => {
                            for record in records {
                                self.subscribe(record);
                            }
                        }
                        Some(Command::Unsubscribe(subscription)) => {
                            self.unsubscribe(subscription);
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }

                // Never closed: the supervisor holds a sender
                Some(event) = self.events_rx.recv() => {
                    self.handle_session_event(event);
                }

                _ = sleep_until(reconnect_at) => {
                    self.reconnect_now();
                }
            }
        }

        self.shutdown();
    }

    /// Start a new session attempt, replacing any attempt still in flight
    fn connect(&mut self) {
        let session = SessionId(self.next_session);
        self.next_session += 1;
        self.current = Some(session);

        info!(session = %session, "Connecting observation WebSocket");
        let handle = self.connector.connect(session, self.events_tx.clone());
        self.connecting = Some(handle);
    }

    /// Schedule a reconnect, re-arming any pending one
    fn reconnect(&mut self) {
        let deadline = Instant::now() + self.reconnect_delay;
        if self.reconnect_at.replace(deadline).is_some() {
            debug!("Reconnect already pending, re-arming timer");
        }
        info!(
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Observation WebSocket reconnect scheduled"
        );
    }

    /// Reconnect timer fired
    fn reconnect_now(&mut self) {
        self.reconnect_at = None;
        self.connect();

        // Clear before re-queueing so no record is replayed twice
        let records = self.registry.drain();
        if !records.is_empty() {
            info!(listeners = records.len(), "Replaying event listeners");
        }
        for record in records {
            self.subscribe(record);
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        if self.current != Some(event.session) {
            debug!(session = %event.session, "Ignoring event from stale session");
            return;
        }

        match event.kind {
            SessionEventKind::Opened => self.on_open(),
            SessionEventKind::Message(text) => self.on_message(&text),
            SessionEventKind::Closed { code, reason } => {
                info!(
                    session = %event.session,
                    code = code,
                    reason = %reason,
                    "Observation WebSocket closed"
                );
                self.on_lost();
            }
            SessionEventKind::Error(e) => {
                warn!(session = %event.session, error = %e, "Observation WebSocket error");
                self.on_lost();
            }
        }
    }

    fn on_open(&mut self) {
        let Some(session) = self.connecting.take() else {
            debug!("Open reported for a session already lost");
            return;
        };
        info!(session = %session.id(), "Observation WebSocket opened");

        match self.gate.resolve(session) {
            Ok(waiting) => {
                for record in waiting {
                    self.register(record);
                }
            }
            Err(session) => {
                warn!(session = %session.id(), "Connection gate already open, dropping session");
            }
        }
    }

    fn on_message(&mut self, text: &str) {
        debug!(message = %text, "Observation WebSocket message");

        match decode_server_message(text) {
            Ok(ServerMessage::Event(event)) => {
                self.registry.dispatch(
                    event.listener_id,
                    &event.event,
                    &event.source,
                    &event.source_data,
                    &event.listener_data,
                );
            }
            Ok(ServerMessage::Other(message_type)) => {
                debug!(message_type = ?message_type, "Ignoring non-event message");
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable message");
            }
        }
    }

    /// Close or error on the current session
    fn on_lost(&mut self) {
        self.connecting = None;
        self.gate.invalidate();
        self.reconnect();
    }

    /// Register now if a session is open, otherwise wait for the gate
    fn subscribe(&mut self, record: SubscriptionRecord) {
        if let Err(record) = self.gate.enqueue(record) {
            self.register(record);
        }
    }

    /// Allocate a listener id and send `addListener` on the open session
    fn register(&mut self, record: SubscriptionRecord) {
        let Some(session) = self.gate.session() else {
            // Only reachable with a pending gate, which accepts the record
            let _ = self.gate.enqueue(record);
            return;
        };

        let event_type = record.event_type.clone();
        let data = record.data.clone();
        let listener_id = self.registry.register(record);

        debug!(
            session = %session.id(),
            listener_id = %listener_id,
            event_type = %event_type,
            "Adding event listener"
        );

        let message = ClientMessage::add_listener(listener_id, event_type, data);
        match message.encode() {
            Ok(text) => {
                // The record stays registered and is replayed after the loss
                if let Err(e) = session.send(text) {
                    warn!(listener_id = %listener_id, error = %e, "Failed to send addListener");
                }
            }
            Err(e) => {
                error!(listener_id = %listener_id, error = %e, "Failed to encode addListener");
            }
        }
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        match self.registry.remove(subscription) {
            Some(listener_id) => {
                debug!(subscription = %subscription, listener_id = %listener_id, "Removed event listener");
            }
            None => {
                self.gate.retain_waiting(|record| record.subscription != subscription);
                debug!(subscription = %subscription, "Removed queued subscription");
            }
        }
    }

    fn shutdown(&mut self) {
        self.reconnect_at = None;
        self.connecting = None;
        if let Some(session) = self.gate.invalidate() {
            session.close();
        }
        info!("Observation supervisor stopped");
    }
}

/// Wait for `deadline`, or forever if there is none
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
