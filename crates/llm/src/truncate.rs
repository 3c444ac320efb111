//! History truncation against a model's token budget.
//!
//! Oldest non-system messages go first, turn by turn, so the kept history
//! always starts at a user message. The most recent user message is never
//! dropped. System messages are only dropped once nothing else is left.

use crate::{Message, Role};

/// Truncation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TruncateError {
    /// The most recent user message alone does not fit.
    #[error("latest user message needs {needed} tokens but the budget is {budget}")]
    Overflow {
        /// Estimated tokens of the message that must be kept.
        needed: usize,
        /// The token budget.
        budget: usize,
    },
}

/// Truncate `messages` so their estimated token count fits `budget`.
pub fn truncate(messages: Vec<Message>, budget: usize) -> Result<Vec<Message>, TruncateError> {
    let mut total: usize = crate::estimate_tokens(&messages);
    if total <= budget {
        return Ok(messages);
    }

    let protected = messages.iter().rposition(|m| m.role == Role::User);
    let mut keep = vec![true; messages.len()];
    let drop_at = |idx: usize, keep: &mut Vec<bool>, total: &mut usize| {
        if keep[idx] {
            keep[idx] = false;
            *total -= messages[idx].estimate_tokens();
        }
    };

    // non-system history before the protected user message, one turn at a time
    let head = protected.unwrap_or(messages.len());
    let mut idx = 0;
    while total > budget && idx < head {
        if messages[idx].role != Role::System {
            drop_at(idx, &mut keep, &mut total);
            // drop the rest of the turn so history restarts at a user message
            let mut next = idx + 1;
            while next < head && messages[next].role != Role::User {
                if messages[next].role != Role::System {
                    drop_at(next, &mut keep, &mut total);
                }
                next += 1;
            }
            idx = next;
            continue;
        }
        idx += 1;
    }

    // messages after the protected user message (tool pre-pass splices)
    if let Some(protected) = protected {
        let mut idx = protected + 1;
        while total > budget && idx < messages.len() {
            let message = &messages[idx];
            if message.role != Role::System {
                drop_at(idx, &mut keep, &mut total);
                for (offset, follower) in messages[idx + 1..].iter().enumerate() {
                    let answers_call = follower.role == Role::Tool
                        && message
                            .tool_calls
                            .iter()
                            .any(|call| call.id == follower.tool_call_id);
                    if answers_call {
                        drop_at(idx + 1 + offset, &mut keep, &mut total);
                    }
                }
            }
            idx += 1;
        }
    }

    // system prompts last
    for (idx, message) in messages.iter().enumerate() {
        if total <= budget {
            break;
        }
        if message.role == Role::System {
            drop_at(idx, &mut keep, &mut total);
        }
    }

    if total > budget {
        return Err(TruncateError::Overflow {
            needed: total,
            budget,
        });
    }

    let dropped = keep.iter().filter(|k| !**k).count();
    tracing::debug!("truncated {dropped} messages to fit {budget} tokens");
    Ok(messages
        .into_iter()
        .zip(keep)
        .filter_map(|(message, keep)| keep.then_some(message))
        .collect())
}
