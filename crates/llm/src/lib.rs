//! LLM provider abstractions for docqa.
//!
//! Defines the completion request/response types, the `LlmClient` trait,
//! and a factory for constructing provider-specific clients.

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
