//! HTTP client for an Ollama-compatible chat service.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fairweather_core::config::ChatConfig;

use crate::error::ChatError;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in the upstream wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Client for the model-listing and streaming-chat endpoints.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        // No overall request timeout: generation legitimately takes minutes
        // on small hardware. The connect timeout still bounds dead hosts.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Names of the models the chat service has installed.
    #[instrument(skip(self), level = "info")]
    pub async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::Unavailable(format!("{}: {}", status, text)));
        }
        let payload: TagsResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(format!("JSON decode error: {}", e)))?;
        Ok(payload.models.into_iter().map(|model| model.name).collect())
    }

    /// Start a streaming completion over the given message history.
    #[instrument(skip(self, messages), level = "info")]
    pub async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> Result<ChunkStream, ChatError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model,
            messages,
            stream: true,
            options: ChatOptions { temperature },
        };
        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::Unavailable(format!("{}: {}", status, text)));
        }
        Ok(ChunkStream::new(response))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

/// One line of the newline-delimited JSON stream. Decoded leniently; the
/// service sends bookkeeping fields we have no use for.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    content: String,
}

/// Incremental assistant output, one content fragment at a time.
pub struct ChunkStream {
    body: Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>,
    buffer: Vec<u8>,
    done: bool,
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("buffer", &self.buffer)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl ChunkStream {
    fn new(response: reqwest::Response) -> Self {
        let body = response.bytes_stream().map(|chunk| chunk.map(|bytes| bytes.to_vec()));
        Self {
            body: Box::pin(body),
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Next fragment of assistant text.
    ///
    /// Returns `Ok(None)` once the service marks the stream finished or the
    /// connection closes cleanly. Network drops and undecodable lines are
    /// errors.
    pub async fn next_content(&mut self) -> Result<Option<String>, ChatError> {
        loop {
            if self.done {
                return Ok(None);
            }
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                if let Some(content) = self.parse_line(&line)? {
                    return Ok(Some(content));
                }
                continue;
            }
            match self.body.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => {
                    // Connection closed; a trailing unterminated line still
                    // counts.
                    self.done = true;
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let line = std::mem::take(&mut self.buffer);
                    return match self.parse_line(&line)? {
                        Some(content) => Ok(Some(content)),
                        None => Ok(None),
                    };
                }
            }
        }
    }

    fn parse_line(&mut self, line: &[u8]) -> Result<Option<String>, ChatError> {
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        let chunk: StreamChunk = serde_json::from_slice(line)
            .map_err(|e| ChatError::InvalidResponse(format!("bad stream chunk: {}", e)))?;
        if chunk.done {
            self.done = true;
        }
        Ok(chunk
            .message
            .and_then(|message| (!message.content.is_empty()).then_some(message.content)))
    }
}
