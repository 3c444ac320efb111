//! Chat sections: a user message plus the assistant messages answering it.

use protocol::{UiMessage, UiRole};

/// A user message and its following run of assistant messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSection {
    /// Id of the leading user message.
    pub id: String,
    /// The leading user message.
    pub user_message: UiMessage,
    /// Assistant messages up to the next user message.
    pub assistant_messages: Vec<UiMessage>,
}

/// Partition `messages` into sections.
///
/// Messages before the first user message and system or data messages
/// belong to no section.
pub fn sections(messages: &[UiMessage]) -> Vec<ChatSection> {
    let mut sections: Vec<ChatSection> = Vec::new();
    for message in messages {
        match message.role {
            UiRole::User => sections.push(ChatSection {
                id: message.id.clone(),
                user_message: message.clone(),
                assistant_messages: Vec::new(),
            }),
            UiRole::Assistant => {
                if let Some(section) = sections.last_mut() {
                    section.assistant_messages.push(message.clone());
                }
            }
            UiRole::System | UiRole::Data => {}
        }
    }
    sections
}
