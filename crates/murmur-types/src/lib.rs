//! Shared domain types for Murmur.
//!
//! This crate contains the core domain types used across the Murmur service:
//! chat sessions, messages, attachments, provider replies, image generation
//! requests, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod image;
pub mod llm;
