//! Typed payloads for the well-known session calls.
//!
//! These pair with [`MessageBus::call`](crate::MessageBus::call). Method
//! names are chosen by the peer, so none are fixed here.
//!
//! ```no_run
//! use socket_bus::MessageBus;
//! use socket_bus::protocol::{InitializeParams, InitializeResult};
//!
//! # async fn example(bus: &MessageBus, method: &str) -> socket_bus::Result<()> {
//! let params = InitializeParams::new("/home/me/project");
//! let result: InitializeResult = bus.call(method, &params).await?;
//! println!("{} {}", result.data.product_name, result.data.version);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResponseError;

// ============================================================================
// ApprovalMode
// ============================================================================

/// How eagerly the agent runs tools without asking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalMode {
    /// Ask before every write, command or network call.
    #[default]
    Default,
    /// Apply edits without asking.
    AutoEdit,
    /// Never ask.
    Yolo,
}

// ============================================================================
// Initialize
// ============================================================================

/// Parameters for opening or resuming a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Working directory of the session.
    pub cwd: String,

    /// Session to resume; a new one is created when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl InitializeParams {
    /// Creates params for a fresh session in `cwd`.
    #[must_use]
    pub fn new(cwd: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            session_id: None,
        }
    }

    /// Resumes an existing session.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Result of an initialize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Whether the session is ready.
    pub success: bool,

    /// Session details.
    pub data: SessionInfo,

    /// Failure details when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

/// Session details returned by initialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionInfo {
    pub product_name: String,
    pub version: String,
    pub session_id: String,
    pub model: String,
    pub approval_mode: ApprovalMode,
    pub session_summary: String,
    pub pasted_text_map: FxHashMap<String, String>,
    pub pasted_image_map: FxHashMap<String, String>,
}

// ============================================================================
// SendMessage
// ============================================================================

/// Parameters for sending a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    pub message: String,
    pub cwd: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Ask the agent to plan instead of acting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_mode: Option<bool>,
}

/// Result of a send-message call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResult {
    pub success: bool,
    pub session_id: String,
}

// ============================================================================
// Cancel / GetStatus
// ============================================================================

/// Identifies one session. Shared by cancel and status calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub cwd: String,
    pub session_id: String,
}

/// Parameters for cancelling the running turn.
pub type CancelParams = SessionParams;

/// Parameters for a status query.
pub type GetStatusParams = SessionParams;

/// Result of a cancel call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResult {
    pub success: bool,

    #[serde(default)]
    pub message: String,
}

/// Result of a status query.
///
/// Fields beyond `status` and `sessionId` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStatusResult {
    pub status: String,
    pub session_id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Tests
// ============================================================================
