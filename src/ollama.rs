//! Ollama `/api/chat` client (blocking, via ureq).
//!
//! Non-streaming calls return one JSON object; streaming calls return
//! newline-delimited JSON chunks, each carrying a `message.content` delta and
//! a final `"done": true`.

use crate::config::OllamaConfig;
use crate::error::{BudgetError, Result};
use crate::generation::{ChatMessage, FragmentStream, TextGenerator};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Lines, Read};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

pub struct OllamaClient {
    agent: ureq::Agent,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(settings: &OllamaConfig, model: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(settings.connect_timeout_secs))
            .timeout_read(Duration::from_secs(settings.timeout_secs))
            .build();
        Self {
            agent,
            base_url: settings.host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn post_chat(&self, task: &str, messages: &[ChatMessage], stream: bool) -> Result<ureq::Response> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%url, task, stream, messages = messages.len(), "posting chat request");

        let body = ChatRequest {
            model: &self.model,
            messages,
            stream,
        };
        self.agent.post(&url).send_json(&body).map_err(|e| match e {
            ureq::Error::Status(code, resp) => {
                let text = resp.into_string().unwrap_or_default();
                BudgetError::generation(task, format!("Ollama returned HTTP {code}: {}", text.trim()))
            }
            ureq::Error::Transport(t) => BudgetError::generation(
                task,
                format!(
                    "{t}. Ensure the Ollama server is running at {} and model '{}' is available.",
                    self.base_url, self.model
                ),
            ),
        })
    }
}

impl TextGenerator for OllamaClient {
    fn complete(&self, task: &str, messages: &[ChatMessage]) -> Result<String> {
        let resp = self.post_chat(task, messages, false)?;
        let chunk: ChatChunk = resp
            .into_json()
            .map_err(|e| BudgetError::generation(task, format!("invalid response from Ollama: {e}")))?;
        if let Some(err) = chunk.error {
            return Err(BudgetError::generation(task, err));
        }
        chunk
            .message
            .map(|m| m.content)
            .ok_or_else(|| BudgetError::generation(task, "invalid response structure from Ollama (no message)"))
    }

    fn stream<'a>(&'a self, task: &str, messages: &[ChatMessage]) -> Result<FragmentStream<'a>> {
        let resp = self.post_chat(task, messages, true)?;
        Ok(Box::new(ChunkStream::new(resp.into_reader(), task)))
    }
}

/// Iterator over the content deltas of an NDJSON chat stream.
///
/// Yields at most one `Err`, after which it is exhausted. A body that ends
/// without a `done` chunk counts as an error.
pub struct ChunkStream<R: Read> {
    lines: Lines<BufReader<R>>,
    task: String,
    finished: bool,
}

impl<R: Read> ChunkStream<R> {
    pub fn new(reader: R, task: &str) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            task: task.to_string(),
            finished: false,
        }
    }

    fn fail(&mut self, reason: impl std::fmt::Display) -> Option<Result<String>> {
        self.finished = true;
        Some(Err(BudgetError::generation(&self.task, reason)))
    }
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            let line = match self.lines.next() {
                None => return self.fail("stream closed before completion"),
                Some(Err(e)) => return self.fail(e),
                Some(Ok(line)) => line,
            };
            if line.trim().is_empty() {
                continue;
            }

            let chunk: ChatChunk = match serde_json::from_str(&line) {
                Ok(c) => c,
                Err(e) => return self.fail(format!("malformed stream chunk: {e}")),
            };
            if let Some(err) = chunk.error {
                return self.fail(err);
            }
            if chunk.done {
                self.finished = true;
            }
            let content = chunk.message.map(|m| m.content).unwrap_or_default();
            if !content.is_empty() {
                return Some(Ok(content));
            }
        }
    }
}
