//! LlmProvider trait definition.
//!
//! This is the core abstraction over the language-model backend.
//! Uses RPITIT for `complete` and `Pin<Box<dyn Stream>>` for `stream`
//! (the stream needs a concrete, sendable type to cross the orchestrator
//! boundary).
//!
//! The concrete implementation lives in murmur-infra and negotiates
//! between the structured chat protocol and the legacy completion
//! protocol; callers only ever see the normalized [`ProviderReply`].

use std::pin::Pin;

use futures_util::Stream;

use murmur_types::llm::{ChatContext, LlmError, ProviderReply, StreamChunk};

/// Trait for the language-model provider backend.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full normalized reply.
    ///
    /// The implementation attempts the structured protocol first and falls
    /// back to the legacy protocol on any non-success response; only when
    /// both fail does this return an error.
    fn complete(
        &self,
        context: &ChatContext,
    ) -> impl std::future::Future<Output = Result<ProviderReply, LlmError>> + Send;

    /// Send a streaming completion request. Returns a stream of chunks:
    /// zero or more content deltas followed by at most one done-chunk
    /// carrying final token statistics.
    fn stream(
        &self,
        context: ChatContext,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send + 'static>>;
}
