//! Provider abstraction for completion calls

use crate::{General, Message, Response, StreamChunk};
use anyhow::Result;
use futures_core::Stream;

/// A trait for completion providers.
///
/// Constructors are inherent methods on each provider and are never called
/// polymorphically.
pub trait LLM: Clone + Send + Sync + 'static {
    /// Send a message list and wait for the complete response
    fn send(
        &self,
        config: &General,
        messages: &[Message],
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send a message list and stream the response
    fn stream(
        &self,
        config: General,
        messages: &[Message],
        usage: bool,
    ) -> impl Stream<Item = Result<StreamChunk>> + Send;
}
