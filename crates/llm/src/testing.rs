//! Scripted provider for deterministic tests.
//!
//! Each `send` or `stream` call pops the next [`Script`] in order. Every
//! call is recorded so tests can assert on the messages and tools the
//! caller produced.

use crate::{
    Choice, Delta, FinishReason, General, LLM, Message, MessageBuilder, Response, Role,
    StreamChunk,
};
use anyhow::{Result, anyhow};
use futures_core::Stream;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum Script {
    /// Stream these chunks, then end.
    Chunks(Vec<StreamChunk>),
    /// Stream these chunks, then fail with the message.
    Failing(Vec<StreamChunk>, String),
    /// Stream these chunks, then never finish.
    Stalled(Vec<StreamChunk>),
    /// Complete a `send` with this text.
    Reply(String),
    /// Fail a `send` with this message.
    ReplyError(String),
}

#[derive(Default)]
struct Inner {
    scripts: VecDeque<Script>,
    requests: Vec<(General, Vec<Message>)>,
}

/// A provider that replays [`Script`]s.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    inner: Arc<Mutex<Inner>>,
    dropped: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    /// Create a provider with the given scripts.
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        let provider = Self::default();
        provider.inner.lock().scripts.extend(scripts);
        provider
    }

    /// Queue another script.
    pub fn push(&self, script: Script) {
        self.inner.lock().scripts.push_back(script);
    }

    /// All recorded calls, in order.
    pub fn requests(&self) -> Vec<(General, Vec<Message>)> {
        self.inner.lock().requests.clone()
    }

    /// Number of streams dropped before they finished.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn next(&self, config: &General, messages: &[Message]) -> Option<Script> {
        let mut inner = self.inner.lock();
        inner.requests.push((config.clone(), messages.to_vec()));
        inner.scripts.pop_front()
    }
}

/// Build a non-streaming response carrying `text`.
pub fn reply(text: impl Into<String>) -> Response {
    Response {
        choices: vec![Choice {
            delta: Delta {
                role: Some(Role::Assistant),
                content: Some(text.into()),
                ..Default::default()
            },
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Counts a stream as dropped unless it was disarmed on completion.
struct DropGuard {
    counter: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl LLM for ScriptedProvider {
    async fn send(&self, config: &General, messages: &[Message]) -> Result<Response> {
        match self.next(config, messages) {
            Some(Script::Reply(text)) => Ok(reply(text)),
            Some(Script::ReplyError(message)) => Err(anyhow!(message)),
            Some(Script::Chunks(chunks)) => {
                let mut builder = MessageBuilder::new(Role::Assistant);
                for chunk in &chunks {
                    builder.accept(chunk);
                }
                Ok(reply(builder.build().content))
            }
            Some(other) => Err(anyhow!("script {other:?} cannot answer send")),
            None => Err(anyhow!("scripted provider exhausted")),
        }
    }

    fn stream(
        &self,
        config: General,
        messages: &[Message],
        _usage: bool,
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        let script = self.next(&config, messages);
        let counter = self.dropped.clone();
        async_stream::try_stream! {
            let mut guard = DropGuard { counter, armed: true };
            match script {
                Some(Script::Chunks(chunks)) => {
                    for chunk in chunks {
                        yield chunk;
                    }
                }
                Some(Script::Failing(chunks, message)) => {
                    for chunk in chunks {
                        yield chunk;
                    }
                    guard.armed = false;
                    Err(anyhow!(message))?;
                }
                Some(Script::Stalled(chunks)) => {
                    for chunk in chunks {
                        yield chunk;
                    }
                    std::future::pending::<()>().await;
                }
                Some(other) => Err(anyhow!("script {other:?} cannot answer stream"))?,
                None => Err(anyhow!("scripted provider exhausted"))?,
            }
            guard.armed = false;
        }
    }
}
