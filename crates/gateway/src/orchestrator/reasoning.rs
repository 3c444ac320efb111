//! Reasoning span timing.

use llm::StreamChunk;
use std::time::Instant;

/// Measures the span from the first reasoning chunk to the first
/// non-reasoning chunk that follows it.
#[derive(Debug, Default)]
pub struct ReasoningTimer {
    started: Option<Instant>,
    total: Option<u64>,
}

impl ReasoningTimer {
    /// A timer with no open span.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a chunk. Returns the span in milliseconds when it closes.
    pub fn observe(&mut self, chunk: &StreamChunk) -> Option<u64> {
        if chunk.reasoning_content().is_some() {
            return self.observe_at(true, Instant::now());
        }
        let carries = chunk.content().is_some()
            || chunk.tool_calls().is_some()
            || chunk.reason().is_some();
        if !carries {
            return None;
        }
        self.observe_at(false, Instant::now())
    }

    fn observe_at(&mut self, reasoning: bool, now: Instant) -> Option<u64> {
        if reasoning {
            self.started.get_or_insert(now);
            return None;
        }
        let started = self.started.take()?;
        let elapsed = u64::try_from(now.duration_since(started).as_millis()).unwrap_or(u64::MAX);
        self.total = Some(self.total.unwrap_or(0).saturating_add(elapsed));
        Some(elapsed)
    }

    /// Close a span still open when the stream ended. Returns its length
    /// in milliseconds.
    pub fn close(&mut self) -> Option<u64> {
        self.observe_at(false, Instant::now())
    }

    /// Sum of all closed spans, `None` if the model never reasoned.
    pub fn total(&self) -> Option<u64> {
        self.total
    }
}
