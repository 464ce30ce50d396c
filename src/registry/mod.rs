use crate::event::{EventType, Listener, SubscriptionId};
use crate::protocol::ListenerId;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};


/// Everything needed to replay a registration and dispatch its events
#[derive(Clone)]
pub struct SubscriptionRecord {
    pub subscription: SubscriptionId,
    pub event_type: EventType,
    pub listener: Listener,
    /// Opaque caller data, sent with the registration
    pub data: Value,
}

impl fmt::Debug for SubscriptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRecord")
            .field("subscription", &self.subscription)
            .field("event_type", &self.event_type)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Listener registry for the current transport session.
///
/// Maps the listener ids sent to the server on the live session to their
/// subscription records. The id counter is never reset, so ids stay unique
/// for the lifetime of the registry even after `drain`.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<ListenerId, SubscriptionRecord>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under the next listener id
    pub fn register(&mut self, record: SubscriptionRecord) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, record);
        id
    }

    /// Invoke the listener registered under `id`.
    ///
    /// Returns false, without invoking anything, when the id is unknown
    /// (stale session, removed subscription, malformed payload). A panic in
    /// the listener is logged and does not propagate.
    pub fn dispatch(
        &self,
        id: Option<ListenerId>,
        event: &Value,
        source: &Value,
        source_data: &Value,
        event_data: &Value,
    ) -> bool {
        let Some(record) = id.and_then(|id| self.listeners.get(&id)) else {
            debug!(listener_id = ?id, "No listener registered, dropping event");
            return false;
        };

        let call = || (record.listener)(event, source, source_data, event_data);
        if panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
            error!(
                listener_id = ?id,
                event_type = %record.event_type,
                "Event listener panicked"
            );
        }
        true
    }

    /// Remove the live registration for a subscription
    pub fn remove(&mut self, subscription: SubscriptionId) -> Option<ListenerId> {
        let id = self.listener_id(subscription)?;
        self.listeners.remove(&id);
        Some(id)
    }

    /// Snapshot and clear all records, in registration order
    pub fn drain(&mut self) -> Vec<SubscriptionRecord> {
        let mut records: Vec<_> = self.listeners.drain().collect();
        records.sort_by_key(|(id, _)| *id);
        records.into_iter().map(|(_, record)| record).collect()
    }

    pub fn get(&self, id: ListenerId) -> Option<&SubscriptionRecord> {
        self.listeners.get(&id)
    }

    /// Listener id currently held by a subscription
    pub fn listener_id(&self, subscription: SubscriptionId) -> Option<ListenerId> {
        self.listeners
            .iter()
            .find(|(_, record)| record.subscription == subscription)
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
