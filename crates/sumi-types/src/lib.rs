//! Shared agent identity and payload types for Sumi.
//!
//! This crate is the relational foundation for the agent subsystem: typed
//! identifiers, the descriptive record an extension contributes for an
//! agent, and the request/result/history payloads that flow through an
//! invocation. It has **no internal sumi dependencies** — a pure leaf crate
//! that other crates build on.
//!
//! # Key Types
//!
//! |----------------------|---------------------------------------------|
//! | Type                 | Purpose                                     |
//! |----------------------|---------------------------------------------|
//! | [`ExtensionId`]      | Which extension owns an agent               |
//! | [`AgentId`]          | Agent name + owning extension               |
//! | [`AgentData`]        | Everything an extension declares statically |
//! | [`SlashCommand`]     | Conditionally visible sub-command           |
//! | [`AgentRequest`]     | One user turn handed to an agent            |
//! | [`AgentResult`]      | What an invocation produced                 |
//! | [`AgentHistoryEntry`]| One past request/result pair                |
//! | [`AgentFollowup`]    | Suggested next action after a turn          |
//! |----------------------|---------------------------------------------|

pub mod agent;
pub mod ids;
pub mod request;

// Re-export primary types at crate root for convenience.
pub use agent::{
    AgentData, AgentIcon, AgentLocation, AgentMetadata, AgentMetadataUpdate, AgentRequester,
    MarkdownString, SlashCommand,
};
pub use ids::{AgentId, ExtensionId};
pub use request::{
    AgentFollowup, AgentHistoryEntry, AgentProgress, AgentRequest, AgentResult,
    AgentWelcomeMessage, ResultTimings, VariableReference,
};
