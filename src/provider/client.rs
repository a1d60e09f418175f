//! Chat-completions client for the gateway.

use super::error::Error;
use super::http::{BearerToken, HttpClient};
use super::response::ChatResponse;
use super::stream::{ChunkDecoder, ChunkStream};
use super::types::ChatRequest;
use crate::config::BASE_URL;

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug)]
pub struct GatewayClient {
    http: HttpClient,
}

impl GatewayClient {
    /// Client for the fixed gateway URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Client for another OpenAI-compatible base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(base_url, BearerToken::new(api_key)),
        }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Make one blocking chat-completion request.
    pub async fn complete(&self, mut request: ChatRequest) -> Result<ChatResponse, Error> {
        request.stream = false;

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "chat completion request"
        );

        self.http.post_json(COMPLETIONS_PATH, &request).await
    }

    /// Start a streamed chat completion.
    ///
    /// Status errors are reported here; failures after the first byte arrive
    /// as items of the returned stream.
    pub async fn stream(&self, mut request: ChatRequest) -> Result<ChunkStream, Error> {
        request.stream = true;

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            temperature = ?request.temperature,
            "chat completion stream request"
        );

        let body = self.http.post_stream(COMPLETIONS_PATH, &request).await?;
        Ok(ChunkDecoder::new(body).into_stream())
    }
}
