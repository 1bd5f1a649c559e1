//! Transport configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use socket_bus::TransportConfig;
//!
//! # fn example() -> socket_bus::Result<()> {
//! let config = TransportConfig::builder("ws://127.0.0.1:8080/ws")
//!     .reconnect_interval(Duration::from_millis(500))
//!     .max_reconnect_interval(Duration::from_secs(10))
//!     .build()?;
//!
//! assert!(config.should_reconnect());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default initial reconnect delay.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default reconnect delay cap.
pub const DEFAULT_MAX_RECONNECT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Default timeout for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// TransportConfig
// ============================================================================

/// Validated configuration consumed by
/// [`WebSocketTransport::new`](super::WebSocketTransport::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    url: Url,
    reconnect_interval: Duration,
    max_reconnect_interval: Duration,
    should_reconnect: bool,
    connect_timeout: Duration,
}

impl TransportConfig {
    /// Creates a configuration with defaults for everything but the URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] or [`Error::Config`] if the URL is not a
    /// valid `ws`/`wss` URL.
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        Self::builder(url).build()
    }

    /// Starts a builder for the given endpoint.
    #[inline]
    #[must_use]
    pub fn builder(url: impl AsRef<str>) -> TransportConfigBuilder {
        TransportConfigBuilder::new(url)
    }

    /// Endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Initial reconnect delay.
    #[inline]
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Reconnect delay cap.
    #[inline]
    #[must_use]
    pub const fn max_reconnect_interval(&self) -> Duration {
        self.max_reconnect_interval
    }

    /// Whether unexpected closes trigger automatic reconnection.
    #[inline]
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        self.should_reconnect
    }

    /// Timeout for a single connection attempt.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

// ============================================================================
// TransportConfigBuilder
// ============================================================================

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone)]
pub struct TransportConfigBuilder {
    url: String,
    reconnect_interval: Duration,
    max_reconnect_interval: Duration,
    should_reconnect: bool,
    connect_timeout: Duration,
}

impl TransportConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new(url: impl AsRef<str>) -> Self {
        Self {
            url: url.as_ref().to_string(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_interval: DEFAULT_MAX_RECONNECT_INTERVAL,
            should_reconnect: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the initial reconnect delay.
    #[inline]
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the reconnect delay cap.
    #[inline]
    #[must_use]
    pub fn max_reconnect_interval(mut self, interval: Duration) -> Self {
        self.max_reconnect_interval = interval;
        self
    }

    /// Enables or disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn should_reconnect(mut self, enabled: bool) -> Self {
        self.should_reconnect = enabled;
        self
    }

    /// Sets the timeout for a single connection attempt.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the URL does not parse
    /// - [`Error::Config`] if the scheme is not `ws`/`wss`, an interval is
    ///   zero, or the initial interval exceeds the cap
    pub fn build(self) -> Result<TransportConfig> {
        let url = Url::parse(&self.url)?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Unsupported URL scheme '{}', expected ws or wss",
                url.scheme()
            )));
        }

        if self.reconnect_interval.is_zero() {
            return Err(Error::config("reconnect_interval must be greater than zero"));
        }

        if self.reconnect_interval > self.max_reconnect_interval {
            return Err(Error::config(format!(
                "reconnect_interval ({}ms) exceeds max_reconnect_interval ({}ms)",
                self.reconnect_interval.as_millis(),
                self.max_reconnect_interval.as_millis()
            )));
        }

        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be greater than zero"));
        }

        Ok(TransportConfig {
            url,
            reconnect_interval: self.reconnect_interval,
            max_reconnect_interval: self.max_reconnect_interval,
            should_reconnect: self.should_reconnect,
            connect_timeout: self.connect_timeout,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
