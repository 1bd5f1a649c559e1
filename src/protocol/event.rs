//! Event frame type.
//!
//! Events are fire-and-forget notifications pushed by the remote end,
//! such as streaming text deltas or session status changes. They carry
//! no id and expect no reply.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::now_millis;

// ============================================================================
// EventFrame
// ============================================================================

/// A named notification.
///
/// # Format
///
/// ```json
/// {
///   "type": "event",
///   "event": "textDelta",
///   "data": { ... },
///   "timestamp": 1718000000000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    /// Event name used to select listeners.
    pub event: String,

    /// Event payload.
    #[serde(default)]
    pub data: Value,

    /// Creation time in epoch milliseconds (diagnostics only).
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub timestamp: u64,
}

impl EventFrame {
    /// Creates a new event frame stamped with the current time.
    #[inline]
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            timestamp: now_millis(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_event_parsing() {
        let json_str = r#"{
            "event": "textDelta",
            "data": { "text": "Hel" },
            "timestamp": 1718000000000
        }"#;

        let event: EventFrame = serde_json::from_str(json_str).expect("parse event");
        assert_eq!(event.event, "textDelta");
        assert_eq!(event.data["text"], "Hel");
        assert_eq!(event.timestamp, 1_718_000_000_000);
    }

    #[test]
    fn test_event_without_data() {
        let event: EventFrame = serde_json::from_str(r#"{"event": "chunk"}"#).expect("parse");
        assert_eq!(event.data, Value::Null);
    }

    #[test]
    fn test_event_new_stamps_time() {
        let event = EventFrame::new("message", json!({"id": 1}));
        assert!(event.timestamp > 0);
    }
}
