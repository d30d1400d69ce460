//! API route handlers.

pub mod chat;
pub mod image;
pub mod session;
