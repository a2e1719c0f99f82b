//! Text-generation seam and stream capture.
//!
//! The generator is an untrusted collaborator: it either returns one completed
//! text or an ordered stream of fragments that may break off at any point.
//! [`capture_stream`] turns such a stream into the text that did arrive plus
//! an explicit signal for whether the stream completed.

use crate::error::{BudgetError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Ordered, finite, non-restartable fragments. An `Err` item ends the stream.
pub type FragmentStream<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

pub trait TextGenerator {
    /// One completed response. `task` names the call in errors.
    fn complete(&self, task: &str, messages: &[ChatMessage]) -> Result<String>;

    /// Incremental response; concatenated fragments form the completed text.
    fn stream<'a>(&'a self, task: &str, messages: &[ChatMessage]) -> Result<FragmentStream<'a>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    /// The producer failed after some content arrived.
    EndedEarly(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedText {
    pub text: String,
    pub end: StreamEnd,
}

impl CapturedText {
    pub fn is_partial(&self) -> bool {
        matches!(self.end, StreamEnd::EndedEarly(_))
    }
}

/// Drain `fragments`, handing each one to `on_fragment` as it arrives.
///
/// A failure before any content is fatal
/// ([`BudgetError::GenerationEmptyPartial`]); a failure afterwards keeps what
/// was captured and reports [`StreamEnd::EndedEarly`].
pub fn capture_stream<F>(task: &str, fragments: FragmentStream<'_>, mut on_fragment: F) -> Result<CapturedText>
where
    F: FnMut(&str),
{
    let mut text = String::new();
    for item in fragments {
        match item {
            Ok(fragment) => {
                if fragment.is_empty() {
                    continue;
                }
                on_fragment(&fragment);
                text.push_str(&fragment);
            }
            Err(err) if text.is_empty() => {
                return Err(BudgetError::GenerationEmptyPartial {
                    task: task.to_string(),
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                warn!(task, captured = text.len(), error = %err, "stream ended early");
                return Ok(CapturedText {
                    text,
                    end: StreamEnd::EndedEarly(err.to_string()),
                });
            }
        }
    }
    Ok(CapturedText {
        text,
        end: StreamEnd::Completed,
    })
}
