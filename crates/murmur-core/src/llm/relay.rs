//! Streaming relay: drive a provider stream, fan tokens out to a caller
//! sink, and reduce the whole stream into one final [`ProviderReply`].
//!
//! The relay never buffers the stream before calling back -- the sink is
//! invoked synchronously from the read loop for every content-bearing
//! chunk, in arrival order, which is the latency characteristic the
//! client-facing streaming contract depends on.
//!
//! There is no retry or backoff here: a mid-stream transport failure
//! surfaces to the orchestrator after whatever partial tokens were already
//! emitted, with the accumulated text preserved so it can be persisted.

use std::time::Instant;

use futures_util::StreamExt;

use murmur_types::llm::{ChatContext, LlmError, ProviderReply, StreamChunk};

use crate::llm::provider::LlmProvider;

/// A relay failure carrying whatever partial content had accumulated
/// before the stream broke. The orchestrator persists the partial text on
/// the error-status assistant message; it is never silently discarded.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct RelayError {
    #[source]
    pub source: LlmError,
    /// Text accumulated before the failure (possibly empty).
    pub partial: String,
}

/// Drive a streaming completion and invoke `on_token(delta, full_text)`
/// for each content-bearing chunk.
///
/// Termination: the provider stream ends either on a chunk explicitly
/// marked done (capturing final stats) or on end-of-stream, whichever
/// comes first. A stream that closes without ever delivering content is a
/// [`LlmError::EmptyStream`], not a valid empty reply.
pub async fn relay<P, F>(
    provider: &P,
    context: ChatContext,
    mut on_token: F,
) -> Result<ProviderReply, RelayError>
where
    P: LlmProvider,
    F: FnMut(&str, &str),
{
    let model = context.options.model.clone();
    let started = Instant::now();

    let mut stream = provider.stream(context);

    let mut full_text = String::new();
    let mut token_count: Option<u32> = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(StreamChunk { done: true, token_count: stats, .. }) => {
                token_count = stats;
                break;
            }
            Ok(chunk) => {
                if chunk.delta.is_empty() {
                    continue;
                }
                full_text.push_str(&chunk.delta);
                on_token(&chunk.delta, &full_text);
            }
            Err(e) => {
                tracing::warn!(error = %e, emitted = full_text.len(), "provider stream failed mid-flight");
                return Err(RelayError {
                    source: e,
                    partial: full_text,
                });
            }
        }
    }

    if full_text.is_empty() {
        return Err(RelayError {
            source: LlmError::EmptyStream,
            partial: String::new(),
        });
    }

    Ok(ProviderReply {
        content: full_text,
        model,
        token_count,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}
