//! Chat session controller.
//!
//! A [`ChatSession`] owns the message list of one chat and runs at most one
//! generation at a time. Operations that start a generation resolve when
//! the response finishes, fails, or is stopped. Observers follow along
//! through [`ChatSession::subscribe`].

use crate::{SessionError, Transport};
use apply::{Applied, Pending, invocation_mut};
use futures_util::StreamExt;
use parking_lot::Mutex;
use pcore::ChatSection;
use protocol::{Chat, ChatRequest, InvocationState, NEW_CHAT_ID, UiMessage, UiRole};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

mod apply;

/// Event channel capacity per subscriber.
const EVENT_CAPACITY: usize = 64;

/// Generation status of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatStatus {
    /// No generation in flight.
    #[default]
    Idle,
    /// Request sent, waiting for the response.
    Submitted,
    /// Response parts are arriving.
    Streaming,
    /// The last generation failed.
    Error,
}

impl ChatStatus {
    /// Whether a generation is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitted | Self::Streaming)
    }
}

/// Notifications published by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The gateway assigned an id to a new chat.
    ChatCreated(String),
    /// A response finished and the chat history changed.
    HistoryUpdated,
    /// The generation status changed.
    StatusChanged(ChatStatus),
    /// Something went wrong; show this to the user.
    Notify(String),
}

struct State {
    id: String,
    messages: Vec<UiMessage>,
    data: Vec<Value>,
    status: ChatStatus,
    cancel: Option<oneshot::Sender<()>>,
}

struct Inner<T> {
    transport: T,
    state: Mutex<State>,
    events: broadcast::Sender<SessionEvent>,
}

/// Controller for one chat conversation.
///
/// Cheap to clone; clones share the same conversation.
pub struct ChatSession<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for ChatSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum Outcome {
    Finished,
    Ended,
    Stopped,
}

impl<T: Transport> ChatSession<T> {
    /// A session for a chat the gateway has not seen yet.
    pub fn new(transport: T) -> Self {
        Self::with_history(transport, NEW_CHAT_ID, Vec::new())
    }

    /// A session continuing an existing conversation.
    pub fn with_history(transport: T, id: impl Into<String>, messages: Vec<UiMessage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                transport,
                state: Mutex::new(State {
                    id: id.into(),
                    messages,
                    data: Vec::new(),
                    status: ChatStatus::Idle,
                    cancel: None,
                }),
                events,
            }),
        }
    }

    /// A session over a stored chat.
    pub fn from_chat(transport: T, chat: Chat) -> Self {
        Self::with_history(transport, chat.id, chat.messages)
    }

    /// The chat id, `"new"` until the gateway assigns one.
    pub fn id(&self) -> String {
        self.inner.state.lock().id.clone()
    }

    /// A snapshot of the messages.
    pub fn messages(&self) -> Vec<UiMessage> {
        self.inner.state.lock().messages.clone()
    }

    /// Stream data received since the last edit or reset.
    pub fn data(&self) -> Vec<Value> {
        self.inner.state.lock().data.clone()
    }

    /// The generation status.
    pub fn status(&self) -> ChatStatus {
        self.inner.state.lock().status
    }

    /// The messages grouped into sections.
    pub fn sections(&self) -> Vec<ChatSection> {
        pcore::sections(&self.inner.state.lock().messages)
    }

    /// Receive events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Add a message and generate a response to it.
    pub async fn append(&self, mut message: UiMessage) -> Result<(), SessionError> {
        if message.id.is_empty() {
            message.id = new_id();
        }
        let (request, cancel) = self.begin(|state| {
            state.messages.push(message);
            Ok(())
        })?;
        self.submit(request, cancel, Pending::default()).await
    }

    /// Regenerate the response to the last user message before `from`, or
    /// to the last user message when `from` is `None`.
    ///
    /// Everything after that user message is dropped first.
    pub async fn reload(&self, from: Option<&str>) -> Result<(), SessionError> {
        let (request, cancel) = self.begin(|state| {
            let end = match from {
                Some(id) => position(&state.messages, id)?,
                None => state.messages.len(),
            };
            let user = state.messages[..end]
                .iter()
                .rposition(|message| message.role == UiRole::User)
                .ok_or(SessionError::NothingToReload)?;
            state.messages.truncate(user + 1);
            Ok(())
        })?;
        self.submit(request, cancel, Pending::default()).await
    }

    /// Replace a user message's content, drop everything after it, and
    /// regenerate.
    pub async fn edit_and_reload(&self, id: &str, content: &str) -> Result<(), SessionError> {
        let (request, cancel) = self.begin(|state| {
            let index = position(&state.messages, id)?;
            let message = &mut state.messages[index];
            if message.role != UiRole::User {
                return Err(SessionError::NotUserMessage(id.to_owned()));
            }
            message.content = content.to_owned();
            message.parts = None;
            state.messages.truncate(index + 1);
            state.data.clear();
            Ok(())
        })?;
        self.submit(request, cancel, Pending::default()).await
    }

    /// Answer a client-side tool call in the last assistant message and
    /// continue that message.
    pub async fn add_tool_result(&self, tool_call_id: &str, result: Value) -> Result<(), SessionError> {
        let (request, cancel) = self.begin(|state| {
            let invocation = state
                .messages
                .last_mut()
                .filter(|message| message.role == UiRole::Assistant)
                .and_then(|message| invocation_mut(message, tool_call_id))
                .filter(|invocation| invocation.state != InvocationState::Result)
                .ok_or_else(|| SessionError::UnknownToolCall(tool_call_id.to_owned()))?;
            invocation.state = InvocationState::Result;
            invocation.result = Some(result);
            Ok(())
        })?;
        let pending = Pending::resume(request.messages.len() - 1);
        self.submit(request, cancel, pending).await
    }

    /// Stop the generation in flight. The partial answer is kept.
    ///
    /// Returns whether there was anything to stop.
    pub fn stop(&self) -> bool {
        let cancel = self.inner.state.lock().cancel.take();
        match cancel {
            Some(cancel) => {
                tracing::debug!("stopping generation");
                let _ = cancel.send(());
                true
            }
            None => false,
        }
    }

    /// Stop and start over with an empty, new chat.
    pub fn reset(&self) {
        self.stop();
        let mut state = self.inner.state.lock();
        state.id = NEW_CHAT_ID.to_owned();
        state.messages.clear();
        state.data.clear();
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }

    fn set_status(&self, status: ChatStatus) {
        self.inner.state.lock().status = status;
        self.emit(SessionEvent::StatusChanged(status));
    }

    /// Apply `prepare` and mark the session submitted, unless a generation
    /// is already in flight.
    fn begin(
        &self,
        prepare: impl FnOnce(&mut State) -> Result<(), SessionError>,
    ) -> Result<(ChatRequest, oneshot::Receiver<()>), SessionError> {
        let mut state = self.inner.state.lock();
        if state.status.is_busy() {
            return Err(SessionError::Busy);
        }
        prepare(&mut state)?;

        let (cancel, cancelled) = oneshot::channel();
        state.cancel = Some(cancel);
        state.status = ChatStatus::Submitted;
        let request = ChatRequest {
            messages: state.messages.clone(),
            id: state.id.clone(),
        };
        drop(state);

        self.emit(SessionEvent::StatusChanged(ChatStatus::Submitted));
        Ok((request, cancelled))
    }

    async fn submit(
        &self,
        request: ChatRequest,
        cancelled: oneshot::Receiver<()>,
        pending: Pending,
    ) -> Result<(), SessionError> {
        let guard = InFlight {
            session: self,
            settled: false,
        };
        let outcome = tokio::select! {
            biased;
            _ = cancelled => Ok(Outcome::Stopped),
            outcome = self.drive(request, pending) => outcome,
        };
        guard.settle(outcome)
    }

    async fn drive(&self, request: ChatRequest, mut pending: Pending) -> Result<Outcome, SessionError> {
        let fresh = request.id == NEW_CHAT_ID;
        let response = self.inner.transport.chat(request).await?;

        if let Some(id) = response.chat_id.filter(|id| fresh && id != NEW_CHAT_ID) {
            tracing::info!("chat created: {id}");
            self.inner.state.lock().id = id.clone();
            self.emit(SessionEvent::ChatCreated(id));
        }
        self.set_status(ChatStatus::Streaming);

        let mut parts = response.parts;
        while let Some(part) = parts.next().await {
            let part = part?;
            let applied = {
                let mut state = self.inner.state.lock();
                let State { messages, data, .. } = &mut *state;
                pending.apply(messages, data, part)
            };
            match applied {
                Applied::Updated => {}
                Applied::Finished => return Ok(Outcome::Finished),
                Applied::Failed(message) => return Err(SessionError::Server(message)),
            }
        }
        Ok(Outcome::Ended)
    }
}

/// Resets the session if a generation future is dropped before it settles.
struct InFlight<'s, T: Transport> {
    session: &'s ChatSession<T>,
    settled: bool,
}

impl<T: Transport> InFlight<'_, T> {
    fn settle(mut self, outcome: Result<Outcome, SessionError>) -> Result<(), SessionError> {
        self.settled = true;
        self.session.inner.state.lock().cancel = None;
        match outcome {
            Ok(outcome) => {
                self.session.set_status(ChatStatus::Idle);
                match outcome {
                    Outcome::Finished => self.session.emit(SessionEvent::HistoryUpdated),
                    Outcome::Ended => tracing::warn!("data stream ended without a finish part"),
                    Outcome::Stopped => tracing::debug!("generation stopped"),
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!("generation failed: {err}");
                self.session.set_status(ChatStatus::Error);
                self.session.emit(SessionEvent::Notify(err.user_message()));
                Err(err)
            }
        }
    }
}

impl<T: Transport> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.session.inner.state.lock().cancel = None;
            self.session.set_status(ChatStatus::Idle);
        }
    }
}

fn position(messages: &[UiMessage], id: &str) -> Result<usize, SessionError> {
    messages
        .iter()
        .position(|message| message.id == id)
        .ok_or_else(|| SessionError::UnknownMessage(id.to_owned()))
}

fn new_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}
