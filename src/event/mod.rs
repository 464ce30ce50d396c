use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

mod validation;

pub use validation::{validate_event_type, ValidationError};

/// Server-side event type a listener subscribes to.
///
/// `id` is the name of the server-side event class (e.g.
/// "org.xwiki.refactoring.event.DocumentRenamedEvent"). `params` are passed
/// to the event constructor on the server, so their names must match the
/// constructor parameter names. They are also used to filter events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventTypeRepr")]
pub struct EventType {
    pub id: String,
    pub params: Map<String, Value>,
}

/// Accepted input forms: a bare id string or `{id, params}`
#[derive(Deserialize)]
#[serde(untagged)]
enum EventTypeRepr {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        params: Map<String, Value>,
    },
}

impl From<EventTypeRepr> for EventType {
    fn from(repr: EventTypeRepr) -> Self {
        match repr {
            EventTypeRepr::Id(id) => EventType::new(id),
            EventTypeRepr::Full { id, params } => EventType { id, params },
        }
    }
}

impl EventType {
    /// Event type with no parameters
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Map::new(),
        }
    }

    /// Adds a constructor parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_event_type(self)
    }
}

impl From<&str> for EventType {
    fn from(id: &str) -> Self {
        EventType::new(id)
    }
}

impl From<String> for EventType {
    fn from(id: String) -> Self {
        EventType::new(id)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}{}", self.id, Value::Object(self.params.clone()))
        }
    }
}

/// One or more event types, normalized to a list.
///
/// Built from a single id, a single `EventType`, or a `Vec`/array of either.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventTypes(Vec<EventType>);

impl EventTypes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventType> {
        self.0.iter()
    }
}

impl IntoIterator for EventTypes {
    type Item = EventType;
    type IntoIter = std::vec::IntoIter<EventType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<&str> for EventTypes {
    fn from(id: &str) -> Self {
        EventTypes(vec![EventType::from(id)])
    }
}

impl From<String> for EventTypes {
    fn from(id: String) -> Self {
        EventTypes(vec![EventType::from(id)])
    }
}

impl From<EventType> for EventTypes {
    fn from(event_type: EventType) -> Self {
        EventTypes(vec![event_type])
    }
}

impl<T: Into<EventType>> From<Vec<T>> for EventTypes {
    fn from(event_types: Vec<T>) -> Self {
        EventTypes(event_types.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<EventType>, const N: usize> From<[T; N]> for EventTypes {
    fn from(event_types: [T; N]) -> Self {
        EventTypes(event_types.into_iter().map(Into::into).collect())
    }
}

/// Callback invoked for every matching server-side event.
///
/// Arguments, in order: the event, its source, data describing the source,
/// and the opaque data supplied when the listener was registered, as
/// echoed back by the server.
pub type Listener = Arc<dyn Fn(&Value, &Value, &Value, &Value) + Send + Sync>;

/// Client-side handle for one subscription.
///
/// Stable across reconnects, unlike the `ListenerId` the subscription is
/// registered under on each session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
