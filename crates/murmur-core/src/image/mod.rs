//! Image generation side-channel for Murmur.
//!
//! - `prompt`: markdown stripping and prompt extraction
//! - `renderer` / `store`: trait seams implemented in murmur-infra
//! - `dispatcher`: the orchestrating `ImageDispatcher`

pub mod dispatcher;
pub mod prompt;
pub mod renderer;
pub mod store;
