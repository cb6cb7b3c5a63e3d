//! WasteTrack external solver adapter.
//!
//! Sends a node set to an OpenAI-compatible chat-completions endpoint and
//! turns the reply into a candidate route for the planner to verify.

pub mod client;
pub mod config;
pub mod prompt;
pub mod response;
pub mod strategy;

pub use client::{SolverClient, SolverError};
pub use config::SolverConfig;
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use response::{parse_reply, strip_framing};
pub use strategy::ExternalSolver;
