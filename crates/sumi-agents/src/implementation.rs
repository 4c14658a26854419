//! The behavior contract an activated agent fulfills.
//!
//! Extensions attach an [`AgentImplementation`] to previously registered
//! agent data. `invoke` is mandatory; the remaining providers are optional
//! capabilities declared up front via [`ImplementationCapabilities`], so
//! the merged view's defaulting is a pure function of the flags rather
//! than a runtime "is this method there" check. The default bodies return
//! the documented fallbacks, letting simple agents implement only
//! `invoke`.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sumi_types::{
    AgentFollowup, AgentHistoryEntry, AgentLocation, AgentProgress, AgentRequest, AgentResult,
    AgentWelcomeMessage,
};

/// Sink for streamed progress parts during an invocation.
///
/// Caller-supplied; the registry hands it through untouched.
pub type ProgressSender = mpsc::UnboundedSender<AgentProgress>;

/// Which optional providers an implementation actually offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImplementationCapabilities {
    /// Offers follow-up suggestions after a turn.
    pub followups: bool,
    /// Contributes a greeting to empty sessions.
    pub welcome_message: bool,
    /// Contributes sample questions per location.
    pub sample_questions: bool,
}

impl ImplementationCapabilities {
    /// No optional providers.
    pub fn none() -> Self {
        Self::default()
    }

    /// Enable the followups provider.
    pub fn with_followups(mut self) -> Self {
        self.followups = true;
        self
    }

    /// Enable the welcome message provider.
    pub fn with_welcome_message(mut self) -> Self {
        self.welcome_message = true;
        self
    }

    /// Enable the sample questions provider.
    pub fn with_sample_questions(mut self) -> Self {
        self.sample_questions = true;
        self
    }
}

/// Executable behavior attached to an agent.
///
/// Invocation errors are the implementation's own and propagate to the
/// caller unchanged; the registry never wraps, retries, or times them
/// out. Cancellation is cooperative — the token is forwarded and it is up
/// to the implementation to observe it.
#[async_trait]
pub trait AgentImplementation: Send + Sync {
    /// Handle one request, streaming progress parts to `progress` and
    /// returning the final result.
    async fn invoke(
        &self,
        request: AgentRequest,
        progress: ProgressSender,
        history: Vec<AgentHistoryEntry>,
        cancel: CancellationToken,
    ) -> anyhow::Result<AgentResult>;

    /// Which optional providers below are actually implemented.
    fn capabilities(&self) -> ImplementationCapabilities {
        ImplementationCapabilities::none()
    }

    /// Suggest follow-up actions for a completed turn.
    ///
    /// Only called when `capabilities().followups` is set.
    async fn provide_followups(
        &self,
        _request: AgentRequest,
        _result: AgentResult,
        _history: Vec<AgentHistoryEntry>,
        _cancel: CancellationToken,
    ) -> anyhow::Result<Vec<AgentFollowup>> {
        Ok(Vec::new())
    }

    /// Greeting for an empty session.
    ///
    /// Only called when `capabilities().welcome_message` is set.
    async fn provide_welcome_message(
        &self,
        _cancel: CancellationToken,
    ) -> anyhow::Result<Option<AgentWelcomeMessage>> {
        Ok(None)
    }

    /// Sample questions for the given location.
    ///
    /// Only called when `capabilities().sample_questions` is set.
    async fn provide_sample_questions(
        &self,
        _location: AgentLocation,
        _cancel: CancellationToken,
    ) -> anyhow::Result<Vec<AgentFollowup>> {
        Ok(Vec::new())
    }
}
