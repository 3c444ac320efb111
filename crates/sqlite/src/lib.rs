//! SQLite-backed chat store for Parley.
//!
//! Provides [`SqliteStore`], a persistent [`Store`] implementation. Each chat
//! is one row; its messages are kept as a JSON array.
//!
//! All SQL lives in `sql/*.sql` files, loaded via `include_str!`.

use anyhow::{Context, Result};
use chrono::DateTime;
use parking_lot::Mutex;
use pcore::Store;
use protocol::{Chat, ChatPage, UiMessage};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use std::{future::Future, path::Path};

const SQL_SCHEMA: &str = include_str!("../sql/schema.sql");
const SQL_UPSERT: &str = include_str!("../sql/upsert.sql");
const SQL_SELECT_CHAT: &str = include_str!("../sql/select_chat.sql");
const SQL_SELECT_PAGE: &str = include_str!("../sql/select_page.sql");
const SQL_DELETE: &str = include_str!("../sql/delete.sql");

/// SQLite-backed chat store.
///
/// Wraps a `rusqlite::Connection` in a `Mutex` for thread safety. Queries
/// run synchronously; the returned futures are already resolved.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open chat database {}", path.display()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SQL_SCHEMA)
            .context("failed to initialize chat schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn save_sync(&self, chat: &Chat) -> Result<()> {
        let messages = serde_json::to_string(&chat.messages)?;
        self.conn.lock().execute(
            SQL_UPSERT,
            params![
                chat.id,
                chat.user_id,
                chat.title,
                chat.path,
                chat.created_at.timestamp_millis(),
                messages,
            ],
        )?;
        Ok(())
    }

    fn get_sync(&self, id: &str, user_id: &str) -> Result<Option<Chat>> {
        let chat = self
            .conn
            .lock()
            .query_row(SQL_SELECT_CHAT, params![id, user_id], chat_from_row)
            .optional()?;
        Ok(chat)
    }

    fn page_sync(&self, user_id: &str, limit: usize, offset: usize) -> Result<ChatPage> {
        // one extra row tells whether another page exists
        let fetch = i64::try_from(limit.saturating_add(1)).unwrap_or(i64::MAX);
        let skip = i64::try_from(offset).unwrap_or(i64::MAX);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(SQL_SELECT_PAGE)?;
        let mut chats = stmt
            .query_map(params![user_id, fetch, skip], chat_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let next_offset = if chats.len() > limit {
            chats.truncate(limit);
            Some(offset + limit)
        } else {
            None
        };
        Ok(ChatPage { chats, next_offset })
    }

    fn delete_sync(&self, id: &str, user_id: &str) -> Result<bool> {
        let removed = self.conn.lock().execute(SQL_DELETE, params![id, user_id])?;
        Ok(removed > 0)
    }
}

impl Store for SqliteStore {
    fn save_chat(&self, chat: Chat) -> impl Future<Output = Result<()>> + Send {
        let result = self.save_sync(&chat);
        async move { result }
    }

    fn get_chat(
        &self,
        id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<Chat>>> + Send {
        let result = self.get_sync(id, user_id);
        async move { result }
    }

    fn chats_page(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<ChatPage>> + Send {
        let result = self.page_sync(user_id, limit, offset);
        async move { result }
    }

    fn delete_chat(&self, id: &str, user_id: &str) -> impl Future<Output = Result<bool>> + Send {
        let result = self.delete_sync(id, user_id);
        async move { result }
    }
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    let created_at: i64 = row.get(4)?;
    let messages: String = row.get(5)?;
    let messages: Vec<UiMessage> = serde_json::from_str(&messages)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Chat {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        path: row.get(3)?,
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
        messages,
    })
}
