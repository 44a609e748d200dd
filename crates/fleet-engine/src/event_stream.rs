//! Server-sent event framing for the chat stream

use fleet_core::wire::{ChatChunk, STREAM_END_EVENT};

/// One dispatched server-sent event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field; `None` means the default `message` type
    pub event: Option<String>,
    pub data: String,
}

/// What a chat stream event means to the chat session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Chunk(String),
    End,
    Error(String),
}

impl SseEvent {
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }

    /// Interpret as a chat event; unrelated event types yield `None`
    pub fn to_chat_event(&self) -> Option<ChatEvent> {
        if self.event.as_deref() == Some(STREAM_END_EVENT) {
            return Some(ChatEvent::End);
        }
        if !self.is_message() {
            return None;
        }
        match serde_json::from_str::<ChatChunk>(&self.data) {
            Ok(chunk) => Some(ChatEvent::Chunk(chunk.chunk)),
            Err(err) => {
                tracing::warn!("Dropping malformed chat chunk: {}", err);
                None
            }
        }
    }
}

/// Incremental `text/event-stream` parser.
///
/// Bytes are pushed as they arrive; complete events (terminated by a blank
/// line) are drained and the trailing partial event stays buffered.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    pending: SseEvent,
    has_data: bool,
}

/// Buffered bytes without a line break before the parser gives up on them
const MAX_LINE_BYTES: usize = 1024 * 1024;

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn drain_events(&mut self) -> Vec<SseEvent> {
        let mut out = Vec::new();
        let mut consumed = 0usize;

        while let Some(nl) = self.buf[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + nl;
            let mut line = &self.buf[consumed..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            let line = String::from_utf8_lossy(line).into_owned();
            consumed = end + 1;

            if let Some(event) = self.process_line(&line) {
                out.push(event);
            }
        }

        self.buf.drain(..consumed);
        if self.buf.len() > MAX_LINE_BYTES {
            tracing::warn!("Event stream line exceeded {} bytes, discarding", MAX_LINE_BYTES);
            self.buf.clear();
        }
        out
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.pending.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.pending.data.push('\n');
                }
                self.pending.data.push_str(value);
                self.has_data = true;
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = std::mem::take(&mut self.pending);
        let had_data = std::mem::replace(&mut self.has_data, false);
        // Named events without data still matter here (`stream-end`)
        if had_data || event.event.is_some() {
            Some(event)
        } else {
            None
        }
    }
}
