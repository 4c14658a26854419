//! # sumi-agents
//!
//! Agent registration and dispatch for Sumi.
//!
//! Extensions contribute chat agents in two phases: declarative
//! [`AgentData`](sumi_types::AgentData) first, an executable
//! [`AgentImplementation`] later once the extension activates. The
//! [`AgentRegistry`] owns the entries, matches identities (agent name +
//! case-insensitive extension id), composes [`MergedAgent`] views over
//! data + implementation, broadcasts [`AgentChange`] notifications, and
//! dispatches invocations to the matching implementation.
//!
//! The registry is bookkeeping, not a scheduler: invocations run on the
//! caller's task, cancellation is cooperative, and implementation errors
//! pass through untouched.

pub mod context;
pub mod implementation;
pub mod merged;
pub mod registry;

pub use context::{AlwaysMatches, ContextKeySource, StaticContextKeys};
pub use implementation::{AgentImplementation, ImplementationCapabilities, ProgressSender};
pub use merged::MergedAgent;
pub use registry::{AgentChange, AgentRegistration, AgentRegistry, RegistryError};
