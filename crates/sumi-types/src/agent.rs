//! The static record an extension contributes for one agent.
//!
//! [`AgentData`] is everything the host knows about an agent before (and
//! independently of) an implementation being attached: display metadata,
//! slash commands, and where in the editor the agent may appear. The
//! `when` conditions on slash commands are kept verbatim — evaluating them
//! against ambient context state is the registry's job, on every read.

use serde::{Deserialize, Serialize};

use crate::ids::AgentId;

/// A markdown value. Opaque to the agent subsystem; rendering is the
/// client's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkdownString(pub String);

impl MarkdownString {
    /// Wrap raw markdown text.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl From<&str> for MarkdownString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An icon reference. Opaque value object — either a theme icon id or a
/// resource URI pair, resolved by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentIcon {
    /// A codicon-style theme icon, e.g. `"robot"`.
    Theme {
        /// Icon identifier within the active theme.
        id: String,
    },
    /// Explicit resource URIs per color theme.
    Uri {
        /// Icon for light themes.
        light: String,
        /// Icon for dark themes.
        dark: String,
    },
}

impl AgentIcon {
    /// A theme icon by id.
    pub fn theme(id: impl Into<String>) -> Self {
        Self::Theme { id: id.into() }
    }
}

/// Who an agent acts on behalf of, for attribution in the request UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequester {
    /// Display name shown next to requests routed to this agent.
    pub name: String,
    /// Optional icon shown with the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<AgentIcon>,
}

/// Descriptive metadata for an agent.
///
/// All fields are presentation-level; none participate in identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Short description shown in pickers.
    pub description: Option<String>,
    /// Full display name; falls back to the agent name when absent.
    pub full_name: Option<String>,
    /// Icon shown in pickers and responses.
    pub icon: Option<AgentIcon>,
    /// Longer help text shown in the agent's help view.
    pub help_text: Option<MarkdownString>,
    /// Secondary agents are offered as an alternate submit action rather
    /// than a first-class participant.
    pub is_secondary: bool,
    /// Example request shown as placeholder text.
    pub sample_request: Option<String>,
    /// Sticky agents stay selected for the follow-up turn.
    pub is_sticky: bool,
    /// Attribution for requests this agent initiates.
    pub requester: Option<AgentRequester>,
}

impl AgentMetadata {
    /// Display name for pickers: the full name when present, otherwise the
    /// agent's short name.
    pub fn display_name<'a>(&'a self, agent_name: &'a str) -> &'a str {
        self.full_name.as_deref().unwrap_or(agent_name)
    }
}

/// A partial metadata record for in-place updates.
///
/// `Some` fields override the current value; `None` fields are left
/// untouched. Boolean flags are optional here so an update can leave them
/// alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMetadataUpdate {
    /// New description, if changing.
    pub description: Option<String>,
    /// New full display name, if changing.
    pub full_name: Option<String>,
    /// New icon, if changing.
    pub icon: Option<AgentIcon>,
    /// New help text, if changing.
    pub help_text: Option<MarkdownString>,
    /// New secondary flag, if changing.
    pub is_secondary: Option<bool>,
    /// New sample request, if changing.
    pub sample_request: Option<String>,
    /// New sticky flag, if changing.
    pub is_sticky: Option<bool>,
    /// New requester attribution, if changing.
    pub requester: Option<AgentRequester>,
}

impl AgentMetadataUpdate {
    /// Shallow-merge this update over `current`, field by field.
    pub fn apply_to(self, current: &mut AgentMetadata) {
        if let Some(description) = self.description {
            current.description = Some(description);
        }
        if let Some(full_name) = self.full_name {
            current.full_name = Some(full_name);
        }
        if let Some(icon) = self.icon {
            current.icon = Some(icon);
        }
        if let Some(help_text) = self.help_text {
            current.help_text = Some(help_text);
        }
        if let Some(is_secondary) = self.is_secondary {
            current.is_secondary = is_secondary;
        }
        if let Some(sample_request) = self.sample_request {
            current.sample_request = Some(sample_request);
        }
        if let Some(is_sticky) = self.is_sticky {
            current.is_sticky = is_sticky;
        }
        if let Some(requester) = self.requester {
            current.requester = Some(requester);
        }
    }
}

/// A named sub-command of an agent (`/fix`, `/explain`, ...).
///
/// Visibility is governed by the optional `when` context-key expression.
/// The expression is stored verbatim and re-evaluated on every read —
/// context state can change between registration and any later read, so
/// the result is never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Command name without the leading slash.
    pub name: String,
    /// Short description shown in the command picker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Context-key expression gating visibility. Absent means always
    /// visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Placeholder text for the follow-up input after this command runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_placeholder: Option<String>,
}

impl SlashCommand {
    /// Create an unconditionally visible slash command.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            when: None,
            followup_placeholder: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Gate visibility on a context-key expression.
    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    /// Set the follow-up input placeholder.
    pub fn with_followup_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.followup_placeholder = Some(placeholder.into());
        self
    }
}

/// Where in the editor an agent can participate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentLocation {
    /// The chat side panel.
    Panel,
    /// Inline terminal chat.
    Terminal,
    /// Inline notebook chat.
    Notebook,
}

/// Everything an extension declares statically about one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentData {
    /// Agent identity (name + owning extension).
    pub id: AgentId,
    /// Whether this agent handles requests addressed to no agent in
    /// particular.
    pub is_default: bool,
    /// Presentation metadata.
    pub metadata: AgentMetadata,
    /// Contributed slash commands, unfiltered. Visibility filtering
    /// against context state happens at read time in the registry.
    pub slash_commands: Vec<SlashCommand>,
    /// Variable names implicitly attached to every request, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_implicit_variables: Option<Vec<String>>,
    /// Editor locations this agent supports.
    pub locations: Vec<AgentLocation>,
}

impl AgentData {
    /// Create agent data with empty metadata, panel location, and no
    /// slash commands.
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            is_default: false,
            metadata: AgentMetadata::default(),
            slash_commands: Vec::new(),
            default_implicit_variables: None,
            locations: vec![AgentLocation::Panel],
        }
    }

    /// Mark as the default agent.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Set the metadata record.
    pub fn with_metadata(mut self, metadata: AgentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a slash command.
    pub fn with_slash_command(mut self, command: SlashCommand) -> Self {
        self.slash_commands.push(command);
        self
    }

    /// Set the supported locations.
    pub fn with_locations(mut self, locations: Vec<AgentLocation>) -> Self {
        self.locations = locations;
        self
    }
}
