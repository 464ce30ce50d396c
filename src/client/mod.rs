use crate::config::ClientConfig;
use crate::event::{EventTypes, Listener, SubscriptionId, ValidationError};
use crate::registry::SubscriptionRecord;
use crate::supervisor::{Command, Supervisor};
use crate::transport::{Connector, WebSocketConnector};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Subscription API errors
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The supervisor task has stopped
    Closed,
    InvalidEventType(ValidationError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Closed => write!(f, "observation client is closed"),
            ClientError::InvalidEventType(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ValidationError> for ClientError {
    fn from(e: ValidationError) -> Self {
        ClientError::InvalidEventType(e)
    }
}

/// Handle for subscribing to server-side events.
///
/// Cheap to clone; all clones talk to the same supervisor. The supervisor
/// stops on `shutdown` or once every handle is dropped.
///
/// # Example
/// ```no_run
/// use observation::ObservationClient;
/// use observation::config::ClientConfig;
/// use serde_json::json;
///
/// # async fn run() -> Result<(), observation::ClientError> {
/// let (client, _supervisor) = ObservationClient::spawn(&ClientConfig::default());
///
/// client.on(
///     "org.xwiki.refactoring.event.DocumentRenamedEvent",
///     |event, source, source_data, data| {
///         println!("{} {} {} {}", event, source, source_data, data);
///     },
///     json!({"panel": "history"}),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ObservationClient {
    commands: mpsc::UnboundedSender<Command>,
    next_subscription: Arc<AtomicU64>,
}

impl ObservationClient {
    /// Connect to `config.url` over WebSocket.
    ///
    /// Must be called within a tokio runtime. Returns the client and the
    /// supervisor task handle.
    pub fn spawn(config: &ClientConfig) -> (Self, JoinHandle<()>) {
        Self::with_connector(
            WebSocketConnector::new(config.url.clone()),
            config.reconnect_delay(),
        )
    }

    /// Run the supervisor over a custom transport
    pub fn with_connector<C: Connector>(
        connector: C,
        reconnect_delay: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(connector, reconnect_delay, commands_rx);
        let task = tokio::spawn(supervisor.run());

        let client = Self {
            commands,
            next_subscription: Arc::new(AtomicU64::new(0)),
        };
        (client, task)
    }

    /// Registers an event listener for one or more server-side event types.
    ///
    /// Never waits: registration happens once a session is open, and again
    /// on every reconnect. `listener` receives the event, its source, data
    /// describing the source, and `data` as echoed by the server.
    ///
    /// Returns one subscription id per event type, in order.
    pub fn on<T, F>(
        &self,
        event_types: T,
        listener: F,
        data: Value,
    ) -> Result<Vec<SubscriptionId>, ClientError>
    where
        T: Into<EventTypes>,
        F: Fn(&Value, &Value, &Value, &Value) + Send + Sync + 'static,
    {
        self.on_listener(event_types, Arc::new(listener), data)
    }

    /// Like `on`, with a shared listener
    pub fn on_listener(
        &self,
        event_types: impl Into<EventTypes>,
        listener: Listener,
        data: Value,
    ) -> Result<Vec<SubscriptionId>, ClientError> {
        let event_types = event_types.into();
        for event_type in event_types.iter() {
            event_type.validate()?;
        }
        if event_types.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<_> = event_types
            .into_iter()
            .map(|event_type| SubscriptionRecord {
                subscription: SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed)),
                event_type,
                listener: Arc::clone(&listener),
                data: data.clone(),
            })
            .collect();
        let ids = records.iter().map(|record| record.subscription).collect();

        self.send(Command::Subscribe(records))?;
        Ok(ids)
    }

    /// Stop delivering events for a subscription.
    ///
    /// The server is not notified; it keeps the listener until the session
    /// ends, and its events are dropped on arrival.
    pub fn off(&self, subscription: SubscriptionId) -> Result<(), ClientError> {
        self.send(Command::Unsubscribe(subscription))
    }

    /// Close the session and stop reconnecting
    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Closed)
    }
}
