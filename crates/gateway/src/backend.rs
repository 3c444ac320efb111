//! Store backend enum for static dispatch over store implementations.

use anyhow::Result;
use pcore::{InMemoryStore, Store};
use protocol::{Chat, ChatPage};
use sqlite::SqliteStore;
use std::{future::Future, path::Path};

/// Chat store selected from gateway configuration.
///
/// Delegates all [`Store`] trait methods to the inner variant.
pub enum StoreBackend {
    /// Volatile in-memory store.
    InMemory(InMemoryStore),
    /// SQLite-backed persistent store.
    Sqlite(SqliteStore),
}

impl StoreBackend {
    /// Create the in-memory variant.
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryStore::new())
    }

    /// Create the sqlite variant at the given path.
    pub fn sqlite(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::Sqlite(SqliteStore::open(path)?))
    }
}

impl Store for StoreBackend {
    fn save_chat(&self, chat: Chat) -> impl Future<Output = Result<()>> + Send {
        async move {
            match self {
                Self::InMemory(s) => s.save_chat(chat).await,
                Self::Sqlite(s) => s.save_chat(chat).await,
            }
        }
    }

    fn get_chat(
        &self,
        id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<Chat>>> + Send {
        async move {
            match self {
                Self::InMemory(s) => s.get_chat(id, user_id).await,
                Self::Sqlite(s) => s.get_chat(id, user_id).await,
            }
        }
    }

    fn chats_page(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<ChatPage>> + Send {
        async move {
            match self {
                Self::InMemory(s) => s.chats_page(user_id, limit, offset).await,
                Self::Sqlite(s) => s.chats_page(user_id, limit, offset).await,
            }
        }
    }

    fn delete_chat(&self, id: &str, user_id: &str) -> impl Future<Output = Result<bool>> + Send {
        async move {
            match self {
                Self::InMemory(s) => s.delete_chat(id, user_id).await,
                Self::Sqlite(s) => s.delete_chat(id, user_id).await,
            }
        }
    }
}
