//! Core abstractions for Parley chats.
//!
//! Section derivation over UI messages, the [`Store`] persistence seam with
//! an in-memory implementation, and the user-facing error taxonomy.

pub use error::ErrorKind;
pub use section::{ChatSection, sections};
pub use store::{InMemoryStore, Store, chat_path, chat_title};

mod error;
mod section;
mod store;
