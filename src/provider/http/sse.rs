//! Server-Sent Events (SSE) parser for streamed chat completions.

/// Payload that terminates an OpenAI-style event stream.
pub const DONE_MARKER: &str = "[DONE]";

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event data (from `data:` lines, joined with `\n`).
    pub data: String,
}

impl SseEvent {
    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_MARKER
    }
}

/// Incremental SSE parser.
///
/// Buffers partial lines and partial UTF-8 sequences across network reads
/// and emits only complete events.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    partial: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from the response body.
    ///
    /// A multi-byte character split across two reads is held back until the
    /// rest of it arrives.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(bytes);

        let complete = match std::str::from_utf8(&self.partial) {
            Ok(_) => self.partial.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.partial.len(),
        };

        let rest = self.partial.split_off(complete);
        let head = std::mem::replace(&mut self.partial, rest);
        let text = String::from_utf8_lossy(&head);
        self.feed(&text)
    }

    /// Feed a chunk of text and return any complete events.
    ///
    /// Events are delimited by a blank line. `\r\n` line endings are
    /// normalized first.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let event_text: String = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = Self::parse_event(&event_text) {
                events.push(event);
            }
        }

        events
    }

    /// Flush whatever is left once the body has ended.
    ///
    /// Some servers close the connection without a trailing blank line after
    /// the last event.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if !self.partial.is_empty() {
            let tail = std::mem::take(&mut self.partial);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }

        let rest = std::mem::take(&mut self.buffer);
        Self::parse_event(&rest).into_iter().collect()
    }

    fn parse_event(text: &str) -> Option<SseEvent> {
        let mut data_parts = Vec::new();

        for line in text.lines() {
            if let Some(value) = line.strip_prefix("data:") {
                data_parts.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
            // `event:`, `id:`, `:` comments and unknown fields are ignored
        }

        if data_parts.is_empty() {
            return None;
        }

        Some(SseEvent {
            data: data_parts.join("\n"),
        })
    }
}
