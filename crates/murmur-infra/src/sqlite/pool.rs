//! SQLite connection handling.
//!
//! One database file, two pools: SQLite serializes writers, so every
//! mutation goes through a single-connection pool while SELECTs fan out
//! over a small read-only pool. Both run in WAL mode with foreign keys
//! enforced. Opening the database also applies the embedded migrations.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Concurrent readers; writes never queue behind these.
const READER_CONNECTIONS: u32 = 8;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool over a single SQLite file.
#[derive(Clone)]
pub struct DatabasePool {
    reader: SqlitePool,
    writer: SqlitePool,
}

impl DatabasePool {
    /// Open the database at `db_path`, creating the file if missing, and
    /// run pending migrations before any reader connects.
    pub async fn open(db_path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }

    /// Pool for SELECT queries.
    pub fn reader(&self) -> &SqlitePool {
        &self.reader
    }

    /// Single-connection pool for INSERT/UPDATE/DELETE.
    pub fn writer(&self) -> &SqlitePool {
        &self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pool.db");
        std::mem::forget(dir);
        DatabasePool::open(&db_path).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_applies_migrations() {
        let pool = open_temp().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(pool.reader())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, ["chat_messages", "chat_sessions", "message_attachments"]);
    }

    #[tokio::test]
    async fn test_wal_and_foreign_keys_active() {
        let pool = open_temp().await;

        let journal: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(pool.writer())
            .await
            .unwrap();
        assert_eq!(journal.0.to_lowercase(), "wal");

        let fk: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(pool.writer())
            .await
            .unwrap();
        assert_eq!(fk.0, 1);
    }

    #[tokio::test]
    async fn test_reader_pool_rejects_writes() {
        let pool = open_temp().await;

        let result = sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, status, created_at, last_activity_at) VALUES ('a', 'b', 'active', '', '')",
        )
        .execute(pool.reader())
        .await;

        assert!(result.is_err(), "reader connections must be read-only");
    }
}
