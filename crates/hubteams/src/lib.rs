//! Multi-agent team orchestration
//!
//! Runs one task across the members of a team under one of four
//! coordination protocols and returns the combined result together with the
//! transcript of messages the members exchanged.

mod orchestrator;
pub mod parsing;
mod store;
mod transcript;

pub use orchestrator::{order_members, TeamOrchestrator};
pub use store::InMemoryTeamStore;
pub use transcript::Transcript;
