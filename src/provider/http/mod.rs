//! HTTP transport for the gateway.

mod client;
mod sse;

pub use client::{BearerToken, HttpClient};
pub use sse::{DONE_MARKER, SseEvent, SseParser};
