//! REST API layer: routing, handlers, error mapping, and response envelope.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
