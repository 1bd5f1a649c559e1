//! Message bus configuration.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default time a request waits for its response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// BusConfig
// ============================================================================

/// Settings for a [`MessageBus`](super::MessageBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Per-request response timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BusConfig {
    /// Creates a configuration with the default request timeout.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disables the per-request timeout.
    #[inline]
    #[must_use]
    pub const fn without_request_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
