//! Infrastructure implementations for Murmur.
//!
//! Concrete backends for the trait seams defined in murmur-core: SQLite
//! persistence, the local-provider HTTP client, the image renderer HTTP
//! client, the filesystem image store, and configuration loading.

pub mod config;
pub mod llm;
pub mod renderer;
pub mod sqlite;
pub mod storage;
