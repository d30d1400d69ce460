//! Business logic and repository trait definitions for Murmur.
//!
//! This crate defines the "ports" (repository, provider, renderer, and
//! storage traits) that the infrastructure layer implements, plus the
//! orchestration logic that ties them together. It depends only on
//! `murmur-types` -- never on `murmur-infra` or any database/IO crate.

pub mod chat;
pub mod image;
pub mod llm;
