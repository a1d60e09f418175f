//! Streaming chat-completion chunks and their decoder.

use super::error::Error;
use super::http::{SseEvent, SseParser};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Deserialize;
use std::collections::VecDeque;

/// Lazy sequence of decoded chunks.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, Error>>;

/// One `data:` payload of a streamed completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Set when the gateway reports a failure mid-stream.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl StreamChunk {
    /// Content delta of the first choice, if it carries any text.
    pub fn first_delta(&self) -> Option<&str> {
        self.choices
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Chunk carrying a single content delta.
    pub fn from_delta(content: impl Into<String>) -> Self {
        Self {
            id: None,
            choices: vec![StreamChoice {
                index: 0,
                delta: Some(StreamDelta {
                    role: None,
                    content: Some(content.into()),
                }),
                finish_reason: None,
            }],
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub delta: Option<StreamDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Turns a raw SSE body into [`StreamChunk`]s.
pub(crate) struct ChunkDecoder {
    body: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    parser: SseParser,
    pending: VecDeque<StreamChunk>,
    failure: Option<Error>,
    finished: bool,
}

impl ChunkDecoder {
    pub(crate) fn new(body: BoxStream<'static, Result<Bytes, reqwest::Error>>) -> Self {
        Self {
            body,
            parser: SseParser::new(),
            pending: VecDeque::new(),
            failure: None,
            finished: false,
        }
    }

    pub(crate) fn into_stream(self) -> ChunkStream {
        futures::stream::unfold(self, |mut decoder| async move {
            let item = decoder.next_chunk().await?;
            Some((item, decoder))
        })
        .boxed()
    }

    async fn next_chunk(&mut self) -> Option<Result<StreamChunk, Error>> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(Ok(chunk));
            }
            if let Some(err) = self.failure.take() {
                return Some(Err(err));
            }
            if self.finished {
                return None;
            }

            let events = match self.body.next().await {
                Some(Ok(bytes)) => self.parser.feed_bytes(&bytes),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(Error::Http(e)));
                }
                None => {
                    self.finished = true;
                    self.parser.finish()
                }
            };

            // chunks decoded before a failure are still delivered first
            if let Err(e) = self.absorb(events) {
                self.finished = true;
                self.failure = Some(e);
            }
        }
    }

    fn absorb(&mut self, events: Vec<SseEvent>) -> Result<(), Error> {
        for event in events {
            if event.data.trim().is_empty() {
                continue;
            }
            if event.is_done() {
                self.finished = true;
                break;
            }

            match serde_json::from_str::<StreamChunk>(&event.data) {
                Ok(StreamChunk {
                    error: Some(error), ..
                }) => return Err(in_stream_error(error, &event.data)),
                Ok(chunk) => self.pending.push_back(chunk),
                Err(e) => {
                    tracing::warn!("Failed to parse stream chunk: {e}\nData: {}", event.data);
                }
            }
        }
        Ok(())
    }
}

/// Convert an `{"error": ...}` payload into an API error.
fn in_stream_error(error: serde_json::Value, data: &str) -> Error {
    let message = error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .unwrap_or(data)
        .to_string();
    Error::Api {
        message,
        body: serde_json::from_str(data).ok(),
    }
}
