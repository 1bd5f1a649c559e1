//! WebSocket protocol frame types.
//!
//! This module defines the message format exchanged between the client
//! and the remote agent.
//!
//! # Protocol Overview
//!
//! | Frame Type | Direction | Purpose |
//! |------------|-----------|---------|
//! | `request` | Both | Method call, correlated by `id` |
//! | `response` | Both | Result or error for a `request` |
//! | `event` | Remote → Local | Named notification |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `approval` | `toolApproval` payloads |
//! | `event` | Event frame |
//! | `frame` | Tagged frame union |
//! | `request` | Request and Response frames |
//! | `session` | Typed payloads for session calls |

// ============================================================================
// Submodules
// ============================================================================

/// Tool approval payloads.
pub mod approval;

/// Event frame type.
pub mod event;

/// Tagged frame union.
pub mod frame;

/// Request and Response frame types.
pub mod request;

/// Typed session call payloads.
pub mod session;

mod timestamp;

// ============================================================================
// Re-exports
// ============================================================================

pub use approval::{
    ApprovalCategory, ApprovalOption, TOOL_APPROVAL_METHOD, ToolApprovalParams,
    ToolApprovalResult, ToolUse,
};
pub use event::EventFrame;
pub use frame::Frame;
pub use request::{RequestFrame, ResponseError, ResponseFrame};
pub use session::{
    ApprovalMode, CancelParams, CancelResult, GetStatusParams, GetStatusResult, InitializeParams,
    InitializeResult, SendMessageParams, SendMessageResult, SessionInfo, SessionParams,
};
