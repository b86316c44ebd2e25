use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::models::{ChatMessage, ChatRole};

pub mod parser;
pub mod sse;

use parser::UiComponent;
use sse::SseRecordDecoder;

/// How long the consumption loop waits for the next transport chunk before
/// giving up on a stalled backend.
const IDLE_CHUNK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("A submission is already in flight")]
    AlreadyPending,

    #[error("Cannot submit an empty message")]
    EmptySubmission,

    #[error("Chat backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat backend returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Chat backend stream error: {0}")]
    Stream(String),

    #[error("Malformed stream record: {0}")]
    Protocol(String),

    #[error("Chat stream timed out")]
    TimedOut,

    #[error("Chat stream cancelled")]
    Cancelled,
}

/// Wire shape of one turn in the model request payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// A single active conversation exchange. The transcript is transient and
/// ordered: turns append in submission order, and chunk application targets
/// the one assistant turn opened by the in-flight submission. The pending
/// flag is the mutual-exclusion guard against a second submission while one
/// is streaming.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Conversation::default()
    }

    /// Rebuilds prior user/assistant turns from a wire history. Turns with
    /// any other role are not part of the transcript model and are skipped.
    pub fn from_history(history: &[WireMessage]) -> Self {
        let messages = history
            .iter()
            .filter_map(|m| match m.role.as_str() {
                "user" => Some(ChatMessage::new(ChatRole::User, m.content.clone())),
                "assistant" => Some(ChatMessage::new(ChatRole::Assistant, m.content.clone())),
                _ => None,
            })
            .collect();
        Conversation { messages, pending: false }
    }

    /// Idle → Sending: appends the user turn plus an empty assistant
    /// placeholder and raises the pending flag.
    pub fn submit(&mut self, text: &str) -> Result<(), ChatError> {
        if self.pending {
            return Err(ChatError::AlreadyPending);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptySubmission);
        }
        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.messages.push(ChatMessage::new(ChatRole::Assistant, ""));
        self.pending = true;
        Ok(())
    }

    /// Appends a content delta to the in-flight assistant turn.
    pub fn apply_content(&mut self, delta: &str) {
        if !self.pending {
            return;
        }
        if let Some(message) = self.messages.last_mut() {
            message.content.push_str(delta);
        }
    }

    /// Attaches an extracted component to the in-flight assistant turn.
    pub fn attach_component(&mut self, component: UiComponent) {
        if !self.pending {
            return;
        }
        if let Some(message) = self.messages.last_mut() {
            message.component = Some(component);
        }
    }

    /// Streaming → Idle.
    pub fn complete(&mut self) {
        self.pending = false;
    }

    /// Streaming → Error: the assistant turn's content is replaced with the
    /// error description and the exchange ends, permitting a new submission.
    pub fn fail(&mut self, description: &str) {
        if let Some(message) = self.messages.last_mut() {
            if message.role == ChatRole::Assistant {
                message.content = description.to_string();
                message.component = None;
            }
        }
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The history sent upstream: every turn up to and including the new
    /// user turn, excluding the empty assistant placeholder.
    pub fn outbound(&self) -> Vec<WireMessage> {
        let turns = match self.messages.last() {
            Some(last) if self.pending && last.role == ChatRole::Assistant => {
                &self.messages[..self.messages.len() - 1]
            }
            _ => &self.messages[..],
        };
        turns
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect()
    }
}

/// Client for the streaming completion endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    stream_timeout: Duration,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        ChatClient {
            http,
            api_url: config.chat_api_url.clone(),
            api_key: config.chat_api_key.clone(),
            model: config.chat_model.clone(),
            stream_timeout: Duration::from_secs(config.chat_stream_timeout_secs),
        }
    }

    /// Posts the message history with `stream: true` and returns the open
    /// completion stream. A non-success status fails the exchange here,
    /// before any chunk is consumed.
    pub async fn open_stream(
        &self,
        messages: &[WireMessage],
        cancel: CancellationToken,
    ) -> Result<CompletionStream, ChatError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ChatError::Upstream { status: status.as_u16(), body });
        }

        Ok(CompletionStream {
            inner: Box::pin(response.bytes_stream()),
            decoder: SseRecordDecoder::new(),
            queue: VecDeque::new(),
            deadline: tokio::time::Instant::now() + self.stream_timeout,
            cancel,
            done: false,
        })
    }
}

/// The consumption side of one streaming exchange. Every await of the next
/// chunk races the cancellation token, the overall deadline and an idle
/// timeout, so a hung backend can never leave the exchange pending forever.
pub struct CompletionStream {
    inner: Pin<Box<dyn Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>,
    decoder: SseRecordDecoder,
    queue: VecDeque<String>,
    deadline: tokio::time::Instant,
    cancel: CancellationToken,
    done: bool,
}

impl std::fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStream")
            .field("queue", &self.queue)
            .field("deadline", &self.deadline)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl CompletionStream {
    /// The next content delta, or None once the backend signals completion.
    pub async fn next_content(&mut self) -> Result<Option<String>, ChatError> {
        loop {
            if let Some(delta) = self.queue.pop_front() {
                return Ok(Some(delta));
            }
            if self.done {
                return Ok(None);
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ChatError::Cancelled),
                _ = tokio::time::sleep_until(self.deadline) => return Err(ChatError::TimedOut),
                next = tokio::time::timeout(IDLE_CHUNK_TIMEOUT, self.inner.next()) => match next {
                    Err(_) => return Err(ChatError::TimedOut),
                    Ok(None) => {
                        self.done = true;
                        continue;
                    }
                    Ok(Some(Err(e))) => return Err(e.into()),
                    Ok(Some(Ok(bytes))) => bytes,
                },
            };

            let records = self
                .decoder
                .push(&chunk)
                .map_err(|e| ChatError::Protocol(format!("invalid UTF-8 in stream: {}", e)))?;

            for record in records {
                if record == "[DONE]" {
                    self.done = true;
                    continue;
                }
                let value: serde_json::Value = serde_json::from_str(&record)
                    .map_err(|e| ChatError::Protocol(format!("unparseable record: {}", e)))?;

                if let Some(error) = value.get("error") {
                    return Err(ChatError::Stream(error.to_string()));
                }
                if let Some(content) = value["choices"][0]["delta"]["content"].as_str() {
                    if !content.is_empty() {
                        self.queue.push_back(content.to_string());
                    }
                }
            }
        }
    }
}
