//! SQLite persistence backends.

pub mod chat;
pub mod pool;

pub use chat::SqliteChatRepository;
pub use pool::DatabasePool;
