//! Typed identifiers for agents and the extensions that own them.
//!
//! Extension identifiers compare case-insensitively (extension manifests are
//! not consistent about casing), while agent names compare exactly. An
//! [`AgentId`] is the pair of both — two agents are the same agent iff their
//! names match and their owning extensions match under the case-insensitive
//! rule.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identifier of the extension that contributed an agent.
///
/// Equality and hashing are ASCII case-insensitive; the original casing is
/// preserved for display.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Wrap an extension identifier, keeping its original casing.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier as originally written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ExtensionId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ExtensionId {}

impl Hash for ExtensionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with the case-insensitive Eq.
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtensionId({})", self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExtensionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of one agent: its name plus the extension that owns it.
///
/// Two extensions may each contribute an agent named `review`; the owning
/// extension disambiguates them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    /// Agent name, unique within the owning extension. Case-sensitive.
    pub name: String,
    /// The extension that contributed this agent.
    pub extension: ExtensionId,
}

impl AgentId {
    /// Create an agent identity.
    pub fn new(name: impl Into<String>, extension: impl Into<ExtensionId>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.extension)
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({}@{})", self.name, self.extension)
    }
}
