//! Tool approval payloads.
//!
//! The remote agent calls `toolApproval` on the client before running a
//! tool that needs consent. The client answers with `{ "approved": bool }`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Constants
// ============================================================================

/// Method name of the peer-initiated approval call.
pub const TOOL_APPROVAL_METHOD: &str = "toolApproval";

// ============================================================================
// ToolUse
// ============================================================================

/// A tool invocation awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    /// Tool name (e.g. `bash`, `write`).
    pub name: String,

    /// Tool arguments.
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Call identifier assigned by the agent.
    #[serde(default)]
    pub call_id: String,
}

// ============================================================================
// ApprovalCategory
// ============================================================================

/// Risk category of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalCategory {
    /// Reads files or state.
    Read,
    /// Modifies files.
    Write,
    /// Runs a shell command.
    Command,
    /// Touches the network.
    Network,
}

// ============================================================================
// ToolApprovalParams / ToolApprovalResult
// ============================================================================

/// Parameters of a `toolApproval` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolApprovalParams {
    /// The tool invocation.
    pub tool_use: ToolUse,

    /// Its risk category.
    pub category: ApprovalCategory,
}

/// Scope of a granted approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOption {
    /// This call only.
    Once,
    /// All future calls of this kind.
    Always,
    /// All future calls of this tool.
    AlwaysTool,
}

/// Result of a `toolApproval` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolApprovalResult {
    /// Whether the tool may run.
    pub approved: bool,

    /// Scope of the approval, if granted beyond this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<ApprovalOption>,
}

impl ToolApprovalResult {
    /// Creates a plain approve/deny result.
    #[inline]
    #[must_use]
    pub const fn new(approved: bool) -> Self {
        Self {
            approved,
            option: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
