//! Local-provider HTTP client with structured/legacy protocol fallback.
//!
//! The structured chat protocol (`POST /api/chat`) is always tried first.
//! On any non-success status the client makes exactly one fallback attempt
//! against the legacy completion protocol (`POST /api/generate`) with the
//! history flattened into a single prompt. When both fail, the error
//! carries the last HTTP status observed. The order is fixed.
//!
//! Streaming goes through the structured protocol only, consuming
//! newline-delimited JSON fragments as they arrive.

mod streaming;
mod types;

use std::pin::Pin;
use std::time::{Duration, Instant};

use futures_util::{Stream, StreamExt};

use murmur_core::llm::provider::LlmProvider;
use murmur_types::llm::{ChatContext, LlmError, ProviderReply, StreamChunk};

use self::streaming::LineBuffer;
use self::types::{
    ChatReply, ChatRequest, GenerateReply, GenerateRequest, RawReply, flatten_prompt,
    wire_messages, wire_options,
};

/// Default request timeout for blocking completions.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for the local model provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn try_chat(&self, context: &ChatContext) -> Result<RawReply, FallbackCause> {
        let request = ChatRequest {
            model: context.options.model.clone(),
            messages: wire_messages(context),
            stream: false,
            options: wire_options(context),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| FallbackCause::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FallbackCause::Status(status));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(e.to_string()))
            .map_err(FallbackCause::Fatal)?;
        Ok(RawReply::Chat(reply))
    }

    async fn try_generate(&self, context: &ChatContext) -> Result<RawReply, LlmError> {
        let request = GenerateRequest {
            model: context.options.model.clone(),
            prompt: flatten_prompt(&context.messages),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(e.to_string()))?;
        Ok(RawReply::Generate(reply))
    }
}

/// Why the structured protocol did not answer, deciding whether the legacy
/// fallback runs. A reply that arrived but failed to deserialize is fatal:
/// the provider is reachable, retrying another protocol would hide a bug.
enum FallbackCause {
    Status(reqwest::StatusCode),
    Transport(String),
    Fatal(LlmError),
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, context: &ChatContext) -> Result<ProviderReply, LlmError> {
        let started = Instant::now();

        let raw = match self.try_chat(context).await {
            Ok(raw) => raw,
            Err(FallbackCause::Fatal(e)) => return Err(e),
            Err(cause) => {
                match &cause {
                    FallbackCause::Status(status) => tracing::warn!(
                        status = status.as_u16(),
                        "chat protocol refused, falling back to legacy completion"
                    ),
                    FallbackCause::Transport(e) => tracing::warn!(
                        error = %e,
                        "chat protocol unreachable, falling back to legacy completion"
                    ),
                    FallbackCause::Fatal(_) => unreachable!(),
                }
                self.try_generate(context).await?
            }
        };

        let (content, token_count) = raw.normalize();

        Ok(ProviderReply {
            content,
            model: context.options.model.clone(),
            token_count,
            // Wall-clock, never trusted from the remote side.
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn stream(
        &self,
        context: ChatContext,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send + 'static>> {
        let client = self.client.clone();
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            model: context.options.model.clone(),
            messages: wire_messages(&context),
            stream: true,
            options: wire_options(&context),
        };

        Box::pin(async_stream::try_stream! {
            let response = client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| LlmError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                Err(LlmError::Http {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
                })?;
            }

            let mut bytes = response.bytes_stream();
            let mut parser = LineBuffer::default();
            let mut terminal = false;

            while let Some(piece) = bytes.next().await {
                let piece = piece.map_err(|e| LlmError::Stream(e.to_string()))?;
                for chunk in parser.push(&piece) {
                    terminal = chunk.done;
                    yield chunk;
                    if terminal {
                        break;
                    }
                }
                if terminal {
                    break;
                }
            }

            if !terminal {
                if let Some(last) = parser.finish() {
                    yield last;
                }
            }
        })
    }
}
