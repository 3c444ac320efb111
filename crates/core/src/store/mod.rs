//! Chat persistence.
//!
//! A [`Store`] keeps chats per user. Writes happen once per completed turn;
//! concurrent writers to the same chat resolve last-write-wins, except
//! `createdAt`, which always keeps the first saved value.

pub use mem::InMemoryStore;

use anyhow::Result;
use protocol::{Chat, ChatPage, UiMessage, UiRole};
use std::future::Future;

mod mem;

/// Longest title, in characters.
const TITLE_MAX_CHARS: usize = 100;

/// Persistent chat storage, scoped by user.
///
/// Uses `&self` for all methods; implementations handle interior
/// mutability.
pub trait Store: Send + Sync + 'static {
    /// Insert or replace a chat. An existing chat keeps its `created_at`.
    fn save_chat(&self, chat: Chat) -> impl Future<Output = Result<()>> + Send;

    /// Load a chat owned by `user_id`.
    fn get_chat(&self, id: &str, user_id: &str)
    -> impl Future<Output = Result<Option<Chat>>> + Send;

    /// A page of the user's chats, newest first.
    fn chats_page(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<ChatPage>> + Send;

    /// Delete a chat. Returns whether it existed.
    fn delete_chat(&self, id: &str, user_id: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Title for a chat: its first user message, truncated.
pub fn chat_title(messages: &[UiMessage]) -> String {
    messages
        .iter()
        .find(|message| message.role == UiRole::User)
        .map(|message| message.content.chars().take(TITLE_MAX_CHARS).collect())
        .unwrap_or_default()
}

/// Client route for a chat.
pub fn chat_path(id: &str) -> String {
    format!("/search/{id}")
}

/// Offset of the page after `offset..offset + limit`, if any chats remain.
pub(crate) fn next_offset(total: usize, limit: usize, offset: usize) -> Option<usize> {
    let end = offset.saturating_add(limit);
    (total > end).then_some(end)
}
