//! Per-request run phases.

use anyhow::{Result, bail};

/// Where a chat run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Converting and truncating history.
    BuildingContext,
    /// Running the manual tool pre-pass.
    ToolPrepass,
    /// Streaming provider output.
    Generating,
    /// Related questions and persistence.
    Finishing,
    /// Finished normally.
    Completed,
    /// Failed; the error was reported to the client.
    Errored,
}

impl Phase {
    /// Whether the run can no longer move.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_advance(self, next: Phase) -> bool {
        use Phase::*;
        match next {
            Errored => !self.is_terminal(),
            _ => matches!(
                (self, next),
                (Idle, BuildingContext)
                    | (BuildingContext, ToolPrepass)
                    | (BuildingContext, Generating)
                    | (ToolPrepass, Generating)
                    | (Generating, Finishing)
                    | (Finishing, Completed)
            ),
        }
    }
}

/// Phase tracker for one chat run.
#[derive(Debug)]
pub struct Run {
    chat_id: String,
    phase: Phase,
}

impl Run {
    /// A run in [`Phase::Idle`].
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            phase: Phase::Idle,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance(next) {
            bail!(
                "invalid phase transition {:?} -> {next:?} for chat {}",
                self.phase,
                self.chat_id
            );
        }
        tracing::debug!("chat {}: {:?} -> {next:?}", self.chat_id, self.phase);
        self.phase = next;
        Ok(())
    }
}
