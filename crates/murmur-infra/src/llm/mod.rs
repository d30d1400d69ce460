//! Language-model provider clients.

pub mod ollama;
