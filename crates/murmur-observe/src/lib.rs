//! Observability for Murmur: tracing initialization and OpenTelemetry
//! GenAI semantic-convention attribute constants.

pub mod genai_attrs;
pub mod tracing_setup;
