//! In-memory implementation of the Store trait.

use super::{Store, next_offset};
use anyhow::Result;
use parking_lot::RwLock;
use protocol::{Chat, ChatPage};
use std::collections::HashMap;

/// In-memory store keyed by `(user_id, chat_id)`.
#[derive(Default, Debug)]
pub struct InMemoryStore {
    chats: RwLock<HashMap<(String, String), Chat>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chats across all users.
    pub fn len(&self) -> usize {
        self.chats.read().len()
    }

    /// Whether no chats are stored.
    pub fn is_empty(&self) -> bool {
        self.chats.read().is_empty()
    }
}

impl Store for InMemoryStore {
    async fn save_chat(&self, mut chat: Chat) -> Result<()> {
        let key = (chat.user_id.clone(), chat.id.clone());
        let mut chats = self.chats.write();
        if let Some(existing) = chats.get(&key) {
            chat.created_at = existing.created_at;
        }
        chats.insert(key, chat);
        Ok(())
    }

    async fn get_chat(&self, id: &str, user_id: &str) -> Result<Option<Chat>> {
        let key = (user_id.to_owned(), id.to_owned());
        Ok(self.chats.read().get(&key).cloned())
    }

    async fn chats_page(&self, user_id: &str, limit: usize, offset: usize) -> Result<ChatPage> {
        let chats = self.chats.read();
        let mut owned: Vec<&Chat> = chats
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, chat)| chat)
            .collect();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(ChatPage {
            next_offset: next_offset(owned.len(), limit, offset),
            chats: owned
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    async fn delete_chat(&self, id: &str, user_id: &str) -> Result<bool> {
        let key = (user_id.to_owned(), id.to_owned());
        Ok(self.chats.write().remove(&key).is_some())
    }
}
