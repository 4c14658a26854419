//! Request, result, and history payloads for agent invocations.
//!
//! These are plain data carriers: the registry stores none of them and
//! inspects none of them — it only moves them between the host and the
//! implementation being invoked.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentLocation, MarkdownString};

/// A variable resolved into a request (`#file`, `#selection`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableReference {
    /// Variable name without the leading `#`.
    pub name: String,
    /// Resolved values, serialized by the variable provider.
    pub values: Vec<serde_json::Value>,
}

/// One user turn handed to an agent implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The chat session this request belongs to.
    pub session_id: String,
    /// Unique id of this request within the session.
    pub request_id: String,
    /// The user's message, with agent and command prefixes stripped.
    pub message: String,
    /// Slash command addressed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Variables resolved for this request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableReference>,
    /// Where the request originated.
    pub location: AgentLocation,
    /// 0 for the first attempt, incremented on regenerate.
    #[serde(default)]
    pub attempt: u32,
}

impl AgentRequest {
    /// Create a panel request with no command or variables.
    pub fn new(
        session_id: impl Into<String>,
        request_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            request_id: request_id.into(),
            message: message.into(),
            command: None,
            variables: Vec::new(),
            location: AgentLocation::Panel,
            attempt: 0,
        }
    }

    /// Address a slash command.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the originating location.
    pub fn with_location(mut self, location: AgentLocation) -> Self {
        self.location = location;
        self
    }
}

/// Wall-clock timings reported for an invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTimings {
    /// Milliseconds until the first progress part arrived.
    pub first_progress_ms: Option<u64>,
    /// Total milliseconds for the invocation.
    pub total_elapsed_ms: u64,
}

/// What an agent invocation produced.
///
/// An "error" result is still a successful invocation at the dispatch
/// layer — `error_details` describes a failure the agent itself chose to
/// report and render. Transport-level failures travel as `Err` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Failure the agent reported, to render in place of a response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Timing information, if the implementation tracked it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<ResultTimings>,
    /// Free-form metadata round-tripped back to the implementation with
    /// follow-up requests.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl AgentResult {
    /// An empty success result.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A result reporting an agent-level error.
    pub fn error(details: impl Into<String>) -> Self {
        Self {
            error_details: Some(details.into()),
            ..Default::default()
        }
    }
}

/// One past request/result pair, oldest first in a history slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentHistoryEntry {
    /// The request as it was issued.
    pub request: AgentRequest,
    /// The result it produced.
    pub result: AgentResult,
}

/// A suggested next action shown after a completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFollowup {
    /// Message to send when the followup is taken.
    pub message: String,
    /// Optional title shown instead of the raw message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional tooltip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl AgentFollowup {
    /// A followup that sends `message` verbatim.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: None,
            tooltip: None,
        }
    }
}

/// Greeting content an agent can contribute to an empty session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentWelcomeMessage {
    /// Greeting paragraphs, rendered in order.
    pub content: Vec<MarkdownString>,
}

/// A streamed progress part emitted during an invocation.
///
/// Opaque to the registry: parts are forwarded to the caller's sink in
/// order and never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentProgress {
    /// Markdown content appended to the response.
    Content {
        /// The markdown fragment.
        content: MarkdownString,
    },
    /// A resource the response refers to.
    Reference {
        /// Serialized reference (URI or symbol), client-rendered.
        reference: serde_json::Value,
    },
    /// Transient status text shown while the agent works.
    Status {
        /// The status message.
        message: String,
    },
}
