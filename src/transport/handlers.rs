//! Subscriber lists for transport notifications.
//!
//! Each list keeps callbacks in registration order. Emitting clones the
//! current callbacks out of the lock first, so a callback may subscribe,
//! unsubscribe or send without deadlocking.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use crate::error::Error;
use crate::identifiers::SubscriptionId;
use crate::protocol::Frame;

// ============================================================================
// Types
// ============================================================================

/// Callback for every inbound frame.
pub type MessageHandler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// Callback for transport-level errors.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Callback for socket closure.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// HandlerList
// ============================================================================

/// Ordered list of subscribers.
pub(crate) struct HandlerList<F: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Arc<F>)>>,
}

impl<F: ?Sized> Default for HandlerList<F> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> HandlerList<F> {
    /// Appends a subscriber.
    pub(crate) fn add(&self, handler: Arc<F>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.entries.lock().push((id, handler));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not in this list.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Returns the number of subscribers.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Invokes every subscriber in registration order.
    ///
    /// A panicking subscriber is logged and does not stop the others.
    pub(crate) fn emit(&self, call: impl Fn(&F)) {
        let snapshot: Vec<Arc<F>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| call(handler.as_ref()))).is_err() {
                error!("Transport subscriber panicked");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
