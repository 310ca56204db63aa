//! LLM completion service.
//!
//! A thin client for OpenAI-compatible chat APIs plus the prompt templates
//! used across the crate. Everything here treats the model as an unreliable
//! collaborator: failures and malformed output degrade features instead of
//! failing commands.

pub mod client;
pub mod error;
pub mod prompts;

pub use client::{ChatMessage, CompletionClient};
pub use error::LlmError;
