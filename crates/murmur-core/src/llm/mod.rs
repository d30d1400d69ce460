//! Language-model provider abstractions for Murmur.
//!
//! - `LlmProvider`: RPITIT trait for the concrete provider client
//! - `relay`: the streaming relay that fans tokens out to a caller sink
//!   while reducing the stream into one final [`murmur_types::llm::ProviderReply`]

pub mod provider;
pub mod relay;
