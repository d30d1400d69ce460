//! Conversation orchestration for Murmur.
//!
//! This module holds the `ChatRepository` trait the infrastructure layer
//! implements, the intent classifier and title derivation helpers, and the
//! `ChatService` orchestrator that drives a full send-message round trip.

pub mod intent;
pub mod repository;
pub mod service;
pub mod title;
