//! Gateway provider: request/response types, HTTP transport, and error
//! classification for the OpenAI-compatible chat-completions API.
//!
//! # Example
//!
//! ```ignore
//! use gonkagate::provider::{ChatMessage, ChatRequest, GatewayClient};
//!
//! let client = GatewayClient::new(api_key);
//! let request = ChatRequest::new(model, vec![ChatMessage::user("hi")]);
//! let response = client.complete(request).await?;
//! ```

mod client;
mod error;
mod http;
mod response;
mod stream;
mod types;

pub use client::GatewayClient;
pub use error::{
    Error, Fallback, UNKNOWN_ERROR, extract_error_message, friendly_message, known_status_message,
};
pub use http::{DONE_MARKER, SseEvent, SseParser};
pub use response::{ChatResponse, Choice, ResponseMessage, Usage};
pub use stream::{ChunkStream, StreamChoice, StreamChunk, StreamDelta};
pub use types::{ChatMessage, ChatRequest, Role};
