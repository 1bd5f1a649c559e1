//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing request ids with registration handles
//! at compile time.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`RequestId`] | Correlates a `request` frame with its `response` |
//! | [`ListenerId`] | Handle for an event listener registered on the bus |
//! | [`SubscriptionId`] | Handle for a transport subscription |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Length of the random suffix appended to generated request ids.
const RANDOM_SUFFIX_LEN: usize = 9;

/// Process-wide sequence shared by every generated [`RequestId`].
static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Process-wide sequence for registration handles.
static HANDLE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Helpers
// ============================================================================

/// Returns the current time as epoch milliseconds.
#[inline]
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_millis)
        .unwrap_or_default()
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
#[inline]
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

// ============================================================================
// RequestId
// ============================================================================

/// Identifier correlating a request frame with its response.
///
/// Locally generated ids have the form `<epoch-ms>-<sequence>-<random>`.
/// The sequence makes ids unique within the process; the random suffix
/// keeps them apart across processes. Ids received from the peer are
/// arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh request id.
    #[must_use]
    pub fn generate() -> Self {
        let sequence = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let random = Uuid::new_v4().simple().to_string();

        Self(format!(
            "{}-{}-{}",
            now_millis(),
            to_base36(sequence),
            &random[..RANDOM_SUFFIX_LEN]
        ))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// Registration Handles
// ============================================================================

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Allocates a new unique handle.
            #[inline]
            #[must_use]
            pub fn next() -> Self {
                Self(HANDLE_SEQUENCE.fetch_add(1, Ordering::Relaxed))
            }

            /// Returns the raw value.
            #[inline]
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle_id!(
    /// Handle returned by [`MessageBus::on_event`](crate::MessageBus::on_event).
    ///
    /// Pass it back to `remove_event_handler` to remove exactly that listener.
    ListenerId
);

handle_id!(
    /// Handle returned by transport subscriptions (`on_message`,
    /// `on_error`, `on_close`).
    SubscriptionId
);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_millis(Duration::from_micros(999)), 0);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_request_id_format() {
        let id = RequestId::generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<u64>().is_ok());
        assert_eq!(parts[2].len(), RANDOM_SUFFIX_LEN);
    }

    #[test]
    fn test_request_id_serde_transparent() {
        let id = RequestId::from("abc");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"abc\"");

        let parsed: RequestId = serde_json::from_str("\"xyz\"").expect("parse");
        assert_eq!(parsed.as_str(), "xyz");
    }

    #[test]
    fn test_request_ids_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| (0..1000).map(|_| RequestId::generate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = FxHashSet::default();
        for handle in handles {
            for id in handle.join().expect("thread") {
                assert!(seen.insert(id), "duplicate request id");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn test_handles_unique() {
        let a = ListenerId::next();
        let b = ListenerId::next();
        let c = SubscriptionId::next();

        assert_ne!(a, b);
        assert_ne!(a.as_u64(), c.as_u64());
    }

    proptest! {
        #[test]
        fn prop_generated_ids_never_collide(count in 1usize..500) {
            let ids: FxHashSet<RequestId> = (0..count).map(|_| RequestId::generate()).collect();
            prop_assert_eq!(ids.len(), count);
        }

        #[test]
        fn prop_base36_roundtrips(value in any::<u64>()) {
            let encoded = to_base36(value);
            prop_assert_eq!(u64::from_str_radix(&encoded, 36).ok(), Some(value));
        }
    }
}
