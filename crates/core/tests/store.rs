//! In-memory store tests.

use chrono::{DateTime, Utc};
use parley_core::{InMemoryStore, Store, chat_path, chat_title};
use protocol::{Chat, UiMessage};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn chat(id: &str, user: &str, created: i64) -> Chat {
    let messages = vec![UiMessage::user("u1", format!("question {id}"))];
    Chat {
        id: id.into(),
        title: chat_title(&messages),
        path: chat_path(id),
        created_at: at(created),
        user_id: user.into(),
        messages,
    }
}

#[tokio::test]
async fn upsert_keeps_created_at() {
    let store = InMemoryStore::new();
    store.save_chat(chat("c1", "alice", 10)).await.unwrap();

    let mut updated = chat("c1", "alice", 99);
    updated.title = "renamed".into();
    store.save_chat(updated).await.unwrap();

    let saved = store.get_chat("c1", "alice").await.unwrap().unwrap();
    assert_eq!(saved.created_at, at(10));
    assert_eq!(saved.title, "renamed");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn chats_are_scoped_by_user() {
    let store = InMemoryStore::new();
    store.save_chat(chat("c1", "alice", 1)).await.unwrap();
    assert!(store.get_chat("c1", "bob").await.unwrap().is_none());
    assert!(!store.delete_chat("c1", "bob").await.unwrap());
    assert!(store.delete_chat("c1", "alice").await.unwrap());
    assert!(store.is_empty());
}

#[tokio::test]
async fn pages_newest_first() {
    let store = InMemoryStore::new();
    for i in 0..5 {
        store
            .save_chat(chat(&format!("c{i}"), "alice", i))
            .await
            .unwrap();
    }

    let first = store.chats_page("alice", 2, 0).await.unwrap();
    let ids: Vec<_> = first.chats.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c4", "c3"]);
    assert_eq!(first.next_offset, Some(2));

    let last = store.chats_page("alice", 2, 4).await.unwrap();
    assert_eq!(last.chats.len(), 1);
    assert_eq!(last.next_offset, None);

    let exact = store.chats_page("alice", 5, 0).await.unwrap();
    assert_eq!(exact.next_offset, None);
}

#[test]
fn title_truncates_first_user_message() {
    let messages = vec![
        UiMessage::assistant("a0", "greeting"),
        UiMessage::user("u1", "é".repeat(150)),
    ];
    assert_eq!(chat_title(&messages).chars().count(), 100);
    assert_eq!(chat_title(&[]), "");
    assert_eq!(chat_path("abc"), "/search/abc");
}
