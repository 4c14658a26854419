//! Agent registration and dispatch.
//!
//! Registration is two-phase: an extension contributes [`AgentData`] up
//! front (cheap, declarative), and attaches an [`AgentImplementation`]
//! later, once it has activated. Dynamic agents skip the split and arrive
//! fully formed. The registry owns the insertion-ordered entry list,
//! matches identities, composes [`MergedAgent`] views, and broadcasts
//! [`AgentChange`] notifications.
//!
//! Cardinality is tens of agents, so every lookup is a linear scan — no
//! index. Entries are keyed internally by a monotonically assigned token;
//! registration handles remove by token, never by value equality, so two
//! entries with equal identities (static + dynamic) stay unambiguous.
//!
//! The single mutex exists to make handle disposal sound; it is never
//! held across an `.await`. Ordering between concurrent invocations is
//! the implementation's business, not the registry's.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use sumi_types::{
    AgentData, AgentFollowup, AgentHistoryEntry, AgentId, AgentMetadataUpdate, AgentRequest,
    AgentResult,
};

use crate::context::ContextKeySource;
use crate::implementation::{AgentImplementation, ProgressSender};
use crate::merged::{MergedAgent, visible_slash_commands};

/// Capacity of the change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Errors for agent registration and dispatch.
///
/// All of these are contract violations raised synchronously at the call
/// site — never transient, never retried. Failures inside an invoked
/// implementation are not represented here; they propagate as-is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// `register_agent` was called with an identity already present.
    #[error("agent already registered: {0}")]
    DuplicateRegistration(AgentId),

    /// An implementation was offered for an identity with no data entry.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// A second implementation was offered for the same entry.
    #[error("implementation already registered: {0}")]
    ImplementationAlreadyRegistered(AgentId),

    /// The operation needs an activated agent and none matched.
    #[error("agent not activated: {0}")]
    NotActivated(AgentId),
}

/// A change to the set of registered agents.
///
/// Carries the specifics the consumer needs: removals name the identity
/// that went away rather than asking listeners to re-enumerate.
#[derive(Debug, Clone)]
pub enum AgentChange {
    /// An agent became usable (implementation attached, or dynamic
    /// registration).
    Added(MergedAgent),
    /// An activated agent's metadata changed.
    Updated(MergedAgent),
    /// An entry was removed.
    Removed(AgentId),
}

/// Stable internal key for one entry. Handles remove by token so equal
/// identities never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryToken(u64);

struct AgentEntry {
    token: EntryToken,
    data: AgentData,
    implementation: Option<Arc<dyn AgentImplementation>>,
}

impl AgentEntry {
    /// Merged view over this entry, if it is activated.
    fn merged(&self, context: &Arc<dyn ContextKeySource>) -> Option<MergedAgent> {
        self.implementation.as_ref().map(|implementation| {
            MergedAgent::new(
                self.data.clone(),
                Arc::clone(context),
                Arc::clone(implementation),
            )
        })
    }
}

struct RegistryInner {
    entries: Vec<AgentEntry>,
    next_token: u64,
}

impl RegistryInner {
    fn allocate_token(&mut self) -> EntryToken {
        let token = EntryToken(self.next_token);
        self.next_token += 1;
        token
    }

    fn find(&self, id: &AgentId) -> Option<&AgentEntry> {
        self.entries.iter().find(|entry| entry.data.id == *id)
    }

    fn find_mut(&mut self, id: &AgentId) -> Option<&mut AgentEntry> {
        self.entries.iter_mut().find(|entry| entry.data.id == *id)
    }

    /// First entry matching `id` that carries an implementation.
    fn find_activated(&self, id: &AgentId) -> Option<&AgentEntry> {
        self.entries
            .iter()
            .find(|entry| entry.data.id == *id && entry.implementation.is_some())
    }
}

/// Registry of agents contributed by extensions.
///
/// Cloning is cheap and clones share state. Mutation happens only through
/// these methods and the disposal of [`AgentRegistration`] handles;
/// serializing mutating callers is the host's responsibility.
#[derive(Clone)]
pub struct AgentRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    context: Arc<dyn ContextKeySource>,
    events: broadcast::Sender<AgentChange>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("entries", &self.inner.lock().entries.len())
            .finish()
    }
}

impl AgentRegistry {
    /// Create an empty registry evaluating `when` conditions against
    /// `context`.
    pub fn new(context: Arc<dyn ContextKeySource>) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                entries: Vec::new(),
                next_token: 0,
            })),
            context,
            events,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentChange> {
        self.events.subscribe()
    }

    fn emit(&self, change: AgentChange) {
        // Fires synchronously after the entry list was updated; ignore
        // "no subscribers".
        let _ = self.events.send(change);
    }

    fn handle(&self, token: EntryToken) -> AgentRegistration {
        AgentRegistration {
            inner: Arc::clone(&self.inner),
            events: self.events.clone(),
            token,
        }
    }

    /// Register agent data. Phase one of two-phase registration.
    ///
    /// Fails with [`RegistryError::DuplicateRegistration`] when the
    /// identity is already present, without mutating anything. No change
    /// event fires — an agent without an implementation is not yet
    /// meaningful downstream. Disposing the returned handle removes the
    /// entry.
    pub fn register_agent(&self, data: AgentData) -> Result<AgentRegistration, RegistryError> {
        let token = {
            let mut inner = self.inner.lock();
            if inner.find(&data.id).is_some() {
                return Err(RegistryError::DuplicateRegistration(data.id.clone()));
            }
            let token = inner.allocate_token();
            debug!(agent = %data.id, "registered agent data");
            inner.entries.push(AgentEntry {
                token,
                data,
                implementation: None,
            });
            token
        };
        Ok(self.handle(token))
    }

    /// Attach an implementation to previously registered data. Phase two.
    ///
    /// Fires [`AgentChange::Added`] with the merged agent. Disposing the
    /// returned handle removes the ENTIRE entry, not just the
    /// implementation — an agent that has been activated once is not
    /// independently meaningful as bare data afterwards.
    pub fn register_agent_implementation(
        &self,
        id: &AgentId,
        implementation: Arc<dyn AgentImplementation>,
    ) -> Result<AgentRegistration, RegistryError> {
        let (token, merged) = {
            let mut inner = self.inner.lock();
            let entry = inner
                .find_mut(id)
                .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))?;
            if entry.implementation.is_some() {
                return Err(RegistryError::ImplementationAlreadyRegistered(id.clone()));
            }
            let merged = MergedAgent::new(
                entry.data.clone(),
                Arc::clone(&self.context),
                Arc::clone(&implementation),
            );
            entry.implementation = Some(implementation);
            debug!(agent = %id, "agent activated");
            (entry.token, merged)
        };
        self.emit(AgentChange::Added(merged));
        Ok(self.handle(token))
    }

    /// Register a fully formed agent (data + implementation) in one shot.
    ///
    /// Skips the duplicate-identity check: dynamic agents are created at
    /// runtime and may shadow a statically contributed identity. Fires
    /// [`AgentChange::Added`]. Disposing the handle removes exactly this
    /// entry.
    pub fn register_dynamic_agent(
        &self,
        data: AgentData,
        implementation: Arc<dyn AgentImplementation>,
    ) -> AgentRegistration {
        let (token, merged) = {
            let mut inner = self.inner.lock();
            let token = inner.allocate_token();
            debug!(agent = %data.id, "registered dynamic agent");
            let merged = MergedAgent::new(
                data.clone(),
                Arc::clone(&self.context),
                Arc::clone(&implementation),
            );
            inner.entries.push(AgentEntry {
                token,
                data,
                implementation: Some(implementation),
            });
            (token, merged)
        };
        self.emit(AgentChange::Added(merged));
        self.handle(token)
    }

    /// Shallow-merge a metadata update into an activated agent.
    ///
    /// Fails with [`RegistryError::NotActivated`] when no matching entry
    /// carries an implementation. Fires [`AgentChange::Updated`].
    pub fn update_agent(
        &self,
        id: &AgentId,
        update: AgentMetadataUpdate,
    ) -> Result<(), RegistryError> {
        let merged = {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .iter_mut()
                .find(|entry| entry.data.id == *id && entry.implementation.is_some())
                .ok_or_else(|| RegistryError::NotActivated(id.clone()))?;
            update.apply_to(&mut entry.data.metadata);
            debug!(agent = %id, "agent metadata updated");
            entry
                .merged(&self.context)
                .ok_or_else(|| RegistryError::NotActivated(id.clone()))?
        };
        self.emit(AgentChange::Updated(merged));
        Ok(())
    }

    /// Data for the first entry matching `id`, slash commands filtered
    /// against current context state.
    pub fn get_agent(&self, id: &AgentId) -> Option<AgentData> {
        let inner = self.inner.lock();
        inner.find(id).map(|entry| self.read_data(entry))
    }

    /// All registered agents in insertion order.
    pub fn get_agents(&self) -> Vec<AgentData> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .map(|entry| self.read_data(entry))
            .collect()
    }

    /// Agents whose name matches exactly, regardless of owning extension.
    pub fn get_agents_by_name(&self, name: &str) -> Vec<AgentData> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter(|entry| entry.data.id.name == name)
            .map(|entry| self.read_data(entry))
            .collect()
    }

    /// Merged views of every entry that currently carries an
    /// implementation.
    pub fn get_activated_agents(&self) -> Vec<MergedAgent> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter_map(|entry| entry.merged(&self.context))
            .collect()
    }

    /// First ACTIVATED agent flagged as default.
    pub fn get_default_agent(&self) -> Option<MergedAgent> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter(|entry| entry.data.is_default)
            .find_map(|entry| entry.merged(&self.context))
    }

    /// First agent flagged as secondary, activated or not.
    ///
    /// Deliberately asymmetric with [`Self::get_default_agent`], which
    /// only considers activated agents.
    pub fn get_secondary_agent(&self) -> Option<AgentData> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .find(|entry| entry.data.metadata.is_secondary)
            .map(|entry| self.read_data(entry))
    }

    /// Whether any entry matches `id`.
    pub fn contains(&self, id: &AgentId) -> bool {
        self.inner.lock().find(id).is_some()
    }

    /// Number of registered entries.
    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Invoke the activated agent matching `id`.
    ///
    /// The implementation `Arc` is cloned out of the lock before the
    /// await; implementation errors propagate unchanged; cancellation is
    /// forwarded, not enforced.
    pub async fn invoke_agent(
        &self,
        id: &AgentId,
        request: AgentRequest,
        progress: ProgressSender,
        history: Vec<AgentHistoryEntry>,
        cancel: CancellationToken,
    ) -> anyhow::Result<AgentResult> {
        let implementation = self.activated_implementation(id)?;
        debug!(agent = %id, request = %request.request_id, "invoking agent");
        implementation
            .invoke(request, progress, history, cancel)
            .await
    }

    /// Follow-up suggestions from the activated agent matching `id`.
    ///
    /// An implementation without the followups capability yields an empty
    /// list, never an error.
    pub async fn get_followups(
        &self,
        id: &AgentId,
        request: AgentRequest,
        result: AgentResult,
        history: Vec<AgentHistoryEntry>,
        cancel: CancellationToken,
    ) -> anyhow::Result<Vec<AgentFollowup>> {
        let implementation = self.activated_implementation(id)?;
        if !implementation.capabilities().followups {
            return Ok(Vec::new());
        }
        implementation
            .provide_followups(request, result, history, cancel)
            .await
    }

    fn activated_implementation(
        &self,
        id: &AgentId,
    ) -> Result<Arc<dyn AgentImplementation>, RegistryError> {
        let inner = self.inner.lock();
        inner
            .find_activated(id)
            .and_then(|entry| entry.implementation.clone())
            .ok_or_else(|| RegistryError::NotActivated(id.clone()))
    }

    fn read_data(&self, entry: &AgentEntry) -> AgentData {
        let mut data = entry.data.clone();
        data.slash_commands =
            visible_slash_commands(&entry.data.slash_commands, self.context.as_ref());
        data
    }
}

/// Handle returned by the registration methods.
///
/// Disposal (explicit or on drop) removes the backing entry by its
/// internal token and fires [`AgentChange::Removed`] with the entry's
/// identity. Removal is idempotent: once the entry is gone, later
/// disposals of sibling handles are no-ops and fire nothing.
#[must_use = "dropping the handle unregisters the agent"]
pub struct AgentRegistration {
    inner: Arc<Mutex<RegistryInner>>,
    events: broadcast::Sender<AgentChange>,
    token: EntryToken,
}

impl AgentRegistration {
    /// Remove the backing entry now.
    pub fn dispose(self) {
        // Drop does the work.
    }

    fn remove_entry(&self) -> Option<AgentId> {
        let mut inner = self.inner.lock();
        let position = inner
            .entries
            .iter()
            .position(|entry| entry.token == self.token)?;
        let entry = inner.entries.remove(position);
        Some(entry.data.id)
    }
}

impl Drop for AgentRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.remove_entry() {
            debug!(agent = %id, "agent unregistered");
            let _ = self.events.send(AgentChange::Removed(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContextKeys;
    use crate::implementation::ImplementationCapabilities;
    use async_trait::async_trait;
    use serde_json::json;
    use sumi_types::{AgentMetadata, AgentProgress, SlashCommand};
    use tokio::sync::mpsc;

    struct EchoAgent {
        reply: &'static str,
        capabilities: ImplementationCapabilities,
    }

    impl EchoAgent {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                capabilities: ImplementationCapabilities::none(),
            }
        }

        fn with_followups(mut self) -> Self {
            self.capabilities = self.capabilities.with_followups();
            self
        }
    }

    #[async_trait]
    impl AgentImplementation for EchoAgent {
        async fn invoke(
            &self,
            request: AgentRequest,
            progress: ProgressSender,
            _history: Vec<AgentHistoryEntry>,
            cancel: CancellationToken,
        ) -> anyhow::Result<AgentResult> {
            if cancel.is_cancelled() {
                anyhow::bail!("invocation cancelled before start");
            }
            let _ = progress.send(AgentProgress::Status {
                message: format!("handling {}", request.request_id),
            });
            Ok(AgentResult {
                metadata: json!({ "reply": self.reply }),
                ..Default::default()
            })
        }

        fn capabilities(&self) -> ImplementationCapabilities {
            self.capabilities
        }

        async fn provide_followups(
            &self,
            _request: AgentRequest,
            _result: AgentResult,
            _history: Vec<AgentHistoryEntry>,
            _cancel: CancellationToken,
        ) -> anyhow::Result<Vec<AgentFollowup>> {
            Ok(vec![AgentFollowup::new("try /fix")])
        }
    }

    fn id(name: &str) -> AgentId {
        AgentId::new(name, "Test.Extension")
    }

    fn data(name: &str) -> AgentData {
        AgentData::new(id(name))
    }

    fn registry() -> (AgentRegistry, Arc<StaticContextKeys>) {
        let keys = Arc::new(StaticContextKeys::new());
        (AgentRegistry::new(keys.clone()), keys)
    }

    fn progress_sink() -> (ProgressSender, mpsc::UnboundedReceiver<AgentProgress>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn register_then_lookup_returns_registered_data() {
        let (registry, _) = registry();
        let _handle = registry
            .register_agent(data("review").with_metadata(AgentMetadata {
                description: Some("reviews code".to_string()),
                ..Default::default()
            }))
            .unwrap();

        let found = registry.get_agent(&id("review")).unwrap();
        assert_eq!(found.id, id("review"));
        assert_eq!(found.metadata.description.as_deref(), Some("reviews code"));
    }

    #[test]
    fn lookup_matches_extension_case_insensitively() {
        let (registry, _) = registry();
        let _handle = registry.register_agent(data("review")).unwrap();

        let other_casing = AgentId::new("review", "test.extension");
        assert!(registry.get_agent(&other_casing).is_some());
        assert!(registry.get_agent(&AgentId::new("Review", "test.extension")).is_none());
    }

    #[test]
    fn duplicate_registration_fails_without_mutating() {
        let (registry, _) = registry();
        let _handle = registry
            .register_agent(data("review").with_metadata(AgentMetadata {
                description: Some("first".to_string()),
                ..Default::default()
            }))
            .unwrap();

        let second = registry.register_agent(data("review").with_metadata(AgentMetadata {
            description: Some("second".to_string()),
            ..Default::default()
        }));
        assert!(matches!(
            second,
            Err(RegistryError::DuplicateRegistration(_))
        ));

        // First registration untouched
        assert_eq!(registry.count(), 1);
        let found = registry.get_agent(&id("review")).unwrap();
        assert_eq!(found.metadata.description.as_deref(), Some("first"));
    }

    #[test]
    fn implementation_requires_registered_data() {
        let (registry, _) = registry();
        let result =
            registry.register_agent_implementation(&id("ghost"), Arc::new(EchoAgent::new("hi")));
        assert!(matches!(result, Err(RegistryError::UnknownAgent(_))));
    }

    #[test]
    fn second_implementation_is_rejected() {
        let (registry, _) = registry();
        let _data = registry.register_agent(data("review")).unwrap();
        let _first = registry
            .register_agent_implementation(&id("review"), Arc::new(EchoAgent::new("a")))
            .unwrap();

        let second =
            registry.register_agent_implementation(&id("review"), Arc::new(EchoAgent::new("b")));
        assert!(matches!(
            second,
            Err(RegistryError::ImplementationAlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn activation_fires_added_with_working_merged_agent() {
        let (registry, _) = registry();
        let mut events = registry.subscribe();
        let _data = registry.register_agent(data("review")).unwrap();
        let _impl = registry
            .register_agent_implementation(&id("review"), Arc::new(EchoAgent::new("done")))
            .unwrap();

        let activated = registry.get_activated_agents();
        assert_eq!(activated.len(), 1);
        assert_eq!(activated[0].id(), &id("review"));

        let AgentChange::Added(merged) = events.try_recv().unwrap() else {
            panic!("expected Added");
        };
        let (progress, _rx) = progress_sink();
        let result = merged
            .invoke(
                AgentRequest::new("s1", "r1", "hello"),
                progress,
                Vec::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.metadata["reply"], "done");
    }

    #[test]
    fn disposing_data_handle_removes_entry_and_fires_removed() {
        let (registry, _) = registry();
        let mut events = registry.subscribe();
        let handle = registry.register_agent(data("review")).unwrap();
        assert_eq!(registry.get_agents().len(), 1);

        handle.dispose();
        assert!(registry.get_agents().is_empty());
        assert!(matches!(
            events.try_recv().unwrap(),
            AgentChange::Removed(removed) if removed == id("review")
        ));
    }

    #[tokio::test]
    async fn disposing_impl_handle_removes_whole_entry() {
        let (registry, _) = registry();
        let data_handle = registry.register_agent(data("review")).unwrap();
        let impl_handle = registry
            .register_agent_implementation(&id("review"), Arc::new(EchoAgent::new("x")))
            .unwrap();

        impl_handle.dispose();
        // Entry is gone entirely, not just deactivated
        assert!(registry.get_agent(&id("review")).is_none());

        let (progress, _rx) = progress_sink();
        let error = registry
            .invoke_agent(
                &id("review"),
                AgentRequest::new("s1", "r1", "hello"),
                progress,
                Vec::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RegistryError>(),
            Some(RegistryError::NotActivated(_))
        ));

        // The data handle now points at nothing; disposing it is a no-op.
        let mut events = registry.subscribe();
        data_handle.dispose();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn dynamic_registration_bypasses_duplicate_check() {
        let (registry, _) = registry();
        let _static_handle = registry.register_agent(data("review")).unwrap();
        let _dynamic_handle =
            registry.register_dynamic_agent(data("review"), Arc::new(EchoAgent::new("dyn")));

        // Both entries coexist
        assert_eq!(registry.get_agents().len(), 2);
        assert_eq!(registry.get_agents_by_name("review").len(), 2);
        assert_eq!(registry.get_activated_agents().len(), 1);
    }

    #[test]
    fn update_agent_merges_metadata() {
        let (registry, _) = registry();
        let mut events = registry.subscribe();
        let _data = registry
            .register_agent(data("review").with_metadata(AgentMetadata {
                description: Some("A".to_string()),
                is_sticky: true,
                ..Default::default()
            }))
            .unwrap();
        let _impl = registry
            .register_agent_implementation(&id("review"), Arc::new(EchoAgent::new("x")))
            .unwrap();
        let _added = events.try_recv().unwrap();

        registry
            .update_agent(
                &id("review"),
                AgentMetadataUpdate {
                    description: Some("B".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let found = registry.get_agent(&id("review")).unwrap();
        assert_eq!(found.metadata.description.as_deref(), Some("B"));
        assert!(found.metadata.is_sticky);

        let AgentChange::Updated(merged) = events.try_recv().unwrap() else {
            panic!("expected Updated");
        };
        assert_eq!(merged.metadata().description.as_deref(), Some("B"));
    }

    #[test]
    fn update_requires_activation() {
        let (registry, _) = registry();
        let _data = registry.register_agent(data("review")).unwrap();

        let result = registry.update_agent(&id("review"), AgentMetadataUpdate::default());
        assert!(matches!(result, Err(RegistryError::NotActivated(_))));
    }

    #[tokio::test]
    async fn followups_default_to_empty_without_capability() {
        let (registry, _) = registry();
        let _data = registry.register_agent(data("review")).unwrap();
        let _impl = registry
            .register_agent_implementation(&id("review"), Arc::new(EchoAgent::new("x")))
            .unwrap();

        let followups = registry
            .get_followups(
                &id("review"),
                AgentRequest::new("s1", "r1", "hello"),
                AgentResult::ok(),
                Vec::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(followups.is_empty());
    }

    #[tokio::test]
    async fn followups_delegate_when_capability_declared() {
        let (registry, _) = registry();
        let _handle = registry.register_dynamic_agent(
            data("review"),
            Arc::new(EchoAgent::new("x").with_followups()),
        );

        let followups = registry
            .get_followups(
                &id("review"),
                AgentRequest::new("s1", "r1", "hello"),
                AgentResult::ok(),
                Vec::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].message, "try /fix");
    }

    #[test]
    fn slash_commands_filter_live_against_context() {
        let (registry, keys) = registry();
        let _handle = registry
            .register_agent(
                data("review")
                    .with_slash_command(SlashCommand::new("fix").with_when("editorFocus"))
                    .with_slash_command(SlashCommand::new("explain")),
            )
            .unwrap();

        let visible = |registry: &AgentRegistry| {
            registry
                .get_agent(&id("review"))
                .unwrap()
                .slash_commands
                .iter()
                .map(|command| command.name.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(visible(&registry), vec!["explain"]);

        keys.set("editorFocus");
        assert_eq!(visible(&registry), vec!["fix", "explain"]);

        keys.clear("editorFocus");
        assert_eq!(visible(&registry), vec!["explain"]);
    }

    #[test]
    fn default_agent_requires_activation() {
        let (registry, _) = registry();
        let _data = registry.register_agent(data("main").as_default()).unwrap();
        assert!(registry.get_default_agent().is_none());

        let _impl = registry
            .register_agent_implementation(&id("main"), Arc::new(EchoAgent::new("x")))
            .unwrap();
        let merged = registry.get_default_agent().unwrap();
        assert_eq!(merged.id(), &id("main"));
    }

    #[test]
    fn secondary_agent_ignores_activation_state() {
        let (registry, _) = registry();
        let _data = registry
            .register_agent(data("aside").with_metadata(AgentMetadata {
                is_secondary: true,
                ..Default::default()
            }))
            .unwrap();

        // No implementation attached, still found
        let secondary = registry.get_secondary_agent().unwrap();
        assert_eq!(secondary.id, id("aside"));
    }

    #[tokio::test]
    async fn invocation_forwards_progress_and_cancellation() {
        let (registry, _) = registry();
        let _handle =
            registry.register_dynamic_agent(data("review"), Arc::new(EchoAgent::new("ok")));

        let (progress, mut rx) = progress_sink();
        registry
            .invoke_agent(
                &id("review"),
                AgentRequest::new("s1", "r42", "hello"),
                progress,
                Vec::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            AgentProgress::Status { message } if message == "handling r42"
        ));

        // A pre-cancelled token surfaces the implementation's own error
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let (progress, _rx) = progress_sink();
        let error = registry
            .invoke_agent(
                &id("review"),
                AgentRequest::new("s1", "r43", "hello"),
                progress,
                Vec::new(),
                cancelled,
            )
            .await
            .unwrap_err();
        assert!(error.to_string().contains("cancelled"));
        assert!(error.downcast_ref::<RegistryError>().is_none());
    }

    #[test]
    fn reads_preserve_insertion_order() {
        let (registry, _) = registry();
        let _a = registry.register_agent(data("alpha")).unwrap();
        let _b = registry.register_agent(data("beta")).unwrap();
        let _c = registry.register_agent(data("gamma")).unwrap();

        let names: Vec<_> = registry
            .get_agents()
            .into_iter()
            .map(|agent| agent.id.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }
}
