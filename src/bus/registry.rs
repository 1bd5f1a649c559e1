//! Event listener and method handler registries.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::error;

use crate::error::Result;
use crate::identifiers::ListenerId;

// ============================================================================
// Types
// ============================================================================

/// Listener invoked with an event's `data`.
pub type EventListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Async handler for a peer-initiated request.
pub type MethodHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

// ============================================================================
// EventRegistry
// ============================================================================

/// Event name to ordered listener list.
#[derive(Default)]
pub(crate) struct EventRegistry {
    listeners: Mutex<FxHashMap<String, Vec<(ListenerId, EventListener)>>>,
}

impl EventRegistry {
    /// Appends a listener for `event`.
    pub(crate) fn add(&self, event: String, listener: EventListener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners
            .lock()
            .entry(event)
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes one listener. Returns `false` if it was not registered for `event`.
    pub(crate) fn remove(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };

        let before = list.len();
        list.retain(|(entry_id, _)| *entry_id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Returns the number of listeners for `event`.
    pub(crate) fn count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Invokes every listener for `event` in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub(crate) fn emit(&self, event: &str, data: &Value) -> usize {
        let snapshot: Vec<EventListener> = match self.listeners.lock().get(event) {
            Some(list) => list.iter().map(|(_, listener)| Arc::clone(listener)).collect(),
            None => return 0,
        };

        for listener in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(data))).is_err() {
                error!(event, "Event listener panicked");
            }
        }
        snapshot.len()
    }
}

// ============================================================================
// MethodRegistry
// ============================================================================

/// Method name to its single handler.
#[derive(Default)]
pub(crate) struct MethodRegistry {
    handlers: Mutex<FxHashMap<String, MethodHandler>>,
}

impl MethodRegistry {
    /// Installs a handler. Returns `true` if it replaced an earlier one.
    pub(crate) fn insert(&self, method: String, handler: MethodHandler) -> bool {
        self.handlers.lock().insert(method, handler).is_some()
    }

    /// Removes a handler. Returns `false` if none was registered.
    pub(crate) fn remove(&self, method: &str) -> bool {
        self.handlers.lock().remove(method).is_some()
    }

    /// Looks up the handler for `method`.
    pub(crate) fn get(&self, method: &str) -> Option<MethodHandler> {
        self.handlers.lock().get(method).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================
