//! Wire frame union.
//!
//! Every WebSocket text message is one JSON object tagged by `type`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::RequestId;

use super::{EventFrame, RequestFrame, ResponseFrame};

// ============================================================================
// Frame
// ============================================================================

/// One structured message exchanged over the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// Method call, from either side.
    Request(RequestFrame),
    /// Answer to a method call.
    Response(ResponseFrame),
    /// Named notification.
    Event(EventFrame),
}

impl Frame {
    /// Creates a request frame.
    #[inline]
    #[must_use]
    pub fn request(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self::Request(RequestFrame::new(id, method, params))
    }

    /// Creates a successful response frame.
    #[inline]
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(ResponseFrame::success(id, result))
    }

    /// Creates an error response frame.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, message: impl Into<String>) -> Self {
        Self::Response(ResponseFrame::failure(id, message))
    }

    /// Creates an event frame.
    #[inline]
    #[must_use]
    pub fn event(event: impl Into<String>, data: Value) -> Self {
        Self::Event(EventFrame::new(event, data))
    }

    /// Returns the wire `type` tag.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Response(_) => "response",
            Self::Event(_) => "event",
        }
    }

    /// Returns the request id for request and response frames.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(request) => Some(&request.id),
            Self::Response(response) => Some(&response.id),
            Self::Event(_) => None,
        }
    }

    /// Parses a frame from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not a
    /// well-formed frame.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<RequestFrame> for Frame {
    #[inline]
    fn from(frame: RequestFrame) -> Self {
        Self::Request(frame)
    }
}

impl From<ResponseFrame> for Frame {
    #[inline]
    fn from(frame: ResponseFrame) -> Self {
        Self::Response(frame)
    }
}

impl From<EventFrame> for Frame {
    #[inline]
    fn from(frame: EventFrame) -> Self {
        Self::Event(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
