//! The merged agent view: static data + attached implementation.
//!
//! A [`MergedAgent`] is what downstream consumers work with once an agent
//! is activated. It is a cheap, cloneable snapshot of the entry's data
//! plus an `Arc` to its implementation — except for slash commands, which
//! stay live: every read re-filters against current context-key state.
//! Optional providers degrade to their documented defaults when the
//! implementation doesn't declare the capability, so callers never probe
//! for support before calling.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sumi_types::{
    AgentData, AgentFollowup, AgentHistoryEntry, AgentId, AgentLocation, AgentMetadata,
    AgentRequest, AgentResult, AgentWelcomeMessage, SlashCommand,
};

use crate::context::ContextKeySource;
use crate::implementation::{AgentImplementation, ProgressSender};

/// Keep only the commands whose `when` condition is absent or holds right
/// now.
pub(crate) fn visible_slash_commands(
    commands: &[SlashCommand],
    context: &dyn ContextKeySource,
) -> Vec<SlashCommand> {
    commands
        .iter()
        .filter(|command| match &command.when {
            Some(expression) => context.matches(expression),
            None => true,
        })
        .cloned()
        .collect()
}

/// Read-only composition of an agent's data and its implementation.
#[derive(Clone)]
pub struct MergedAgent {
    data: AgentData,
    context: Arc<dyn ContextKeySource>,
    implementation: Arc<dyn AgentImplementation>,
}

impl fmt::Debug for MergedAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedAgent")
            .field("id", &self.data.id)
            .field("is_default", &self.data.is_default)
            .field("capabilities", &self.implementation.capabilities())
            .finish()
    }
}

impl MergedAgent {
    pub(crate) fn new(
        data: AgentData,
        context: Arc<dyn ContextKeySource>,
        implementation: Arc<dyn AgentImplementation>,
    ) -> Self {
        Self {
            data,
            context,
            implementation,
        }
    }

    /// The agent's identity.
    pub fn id(&self) -> &AgentId {
        &self.data.id
    }

    /// Whether this agent handles unaddressed requests.
    pub fn is_default(&self) -> bool {
        self.data.is_default
    }

    /// Presentation metadata.
    pub fn metadata(&self) -> &AgentMetadata {
        &self.data.metadata
    }

    /// Supported editor locations.
    pub fn locations(&self) -> &[AgentLocation] {
        &self.data.locations
    }

    /// Slash commands visible under current context-key state.
    ///
    /// Re-evaluated on every call; never cached.
    pub fn slash_commands(&self) -> Vec<SlashCommand> {
        visible_slash_commands(&self.data.slash_commands, self.context.as_ref())
    }

    /// The agent data as registered, with slash commands filtered live.
    pub fn data(&self) -> AgentData {
        let mut data = self.data.clone();
        data.slash_commands = self.slash_commands();
        data
    }

    /// Invoke the implementation. Errors propagate unchanged.
    pub async fn invoke(
        &self,
        request: AgentRequest,
        progress: ProgressSender,
        history: Vec<AgentHistoryEntry>,
        cancel: CancellationToken,
    ) -> anyhow::Result<AgentResult> {
        self.implementation
            .invoke(request, progress, history, cancel)
            .await
    }

    /// Follow-up suggestions, or an empty list when the implementation
    /// doesn't provide them.
    pub async fn provide_followups(
        &self,
        request: AgentRequest,
        result: AgentResult,
        history: Vec<AgentHistoryEntry>,
        cancel: CancellationToken,
    ) -> anyhow::Result<Vec<AgentFollowup>> {
        if !self.implementation.capabilities().followups {
            return Ok(Vec::new());
        }
        self.implementation
            .provide_followups(request, result, history, cancel)
            .await
    }

    /// Welcome message, or `None` when the implementation doesn't provide
    /// one.
    pub async fn provide_welcome_message(
        &self,
        cancel: CancellationToken,
    ) -> anyhow::Result<Option<AgentWelcomeMessage>> {
        if !self.implementation.capabilities().welcome_message {
            return Ok(None);
        }
        self.implementation.provide_welcome_message(cancel).await
    }

    /// Sample questions for a location, or an empty list when the
    /// implementation doesn't provide them.
    pub async fn provide_sample_questions(
        &self,
        location: AgentLocation,
        cancel: CancellationToken,
    ) -> anyhow::Result<Vec<AgentFollowup>> {
        if !self.implementation.capabilities().sample_questions {
            return Ok(Vec::new());
        }
        self.implementation
            .provide_sample_questions(location, cancel)
            .await
    }
}
