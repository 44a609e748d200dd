//! Chat panel state over a streamed assistant reply

use serde::Serialize;

use crate::event_stream::ChatEvent;

pub const USER_SPEAKER: &str = "You";
pub const ASSISTANT_SPEAKER: &str = "Vespera";
pub const CONNECTION_ERROR_SUFFIX: &str = " (Connection error)";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub speaker: String,
    pub text: String,
    /// Reply still streaming (typing cursor shown)
    pub typing: bool,
}

/// A stream the host should open for the latest message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub generation: u64,
    pub message: String,
}

/// Chat log plus the single open reply stream.
///
/// Every `send` bumps the generation; events tagged with an older generation
/// come from a stream that was closed and are dropped.
#[derive(Clone, Debug, Serialize)]
pub struct ChatSession {
    pub entries: Vec<ChatEntry>,
    pub input_enabled: bool,
    generation: u64,
    open: Option<OpenStream>,
}

#[derive(Clone, Copy, Debug, Serialize)]
struct OpenStream {
    generation: u64,
    /// Index of the assistant entry receiving chunks
    entry: usize,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            input_enabled: true,
            generation: 0,
            open: None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_generation(&self) -> Option<u64> {
        self.open.map(|o| o.generation)
    }

    /// Queue a message; blank input is ignored
    pub fn send(&mut self, message: &str) -> Option<ChatRequest> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        if let Some(prev) = self.open.take() {
            tracing::debug!("Closing chat stream {} for a new message", prev.generation);
            if let Some(entry) = self.entries.get_mut(prev.entry) {
                entry.typing = false;
            }
        }

        self.entries.push(ChatEntry {
            speaker: USER_SPEAKER.to_string(),
            text: message.to_string(),
            typing: false,
        });
        self.entries.push(ChatEntry {
            speaker: ASSISTANT_SPEAKER.to_string(),
            text: String::new(),
            typing: true,
        });
        self.input_enabled = false;

        self.generation += 1;
        self.open = Some(OpenStream {
            generation: self.generation,
            entry: self.entries.len() - 1,
        });

        Some(ChatRequest {
            generation: self.generation,
            message: message.to_string(),
        })
    }

    /// Apply a stream event; returns false when it came from a closed stream
    pub fn on_event(&mut self, generation: u64, event: ChatEvent) -> bool {
        let Some(open) = self.open.filter(|o| o.generation == generation) else {
            tracing::debug!("Ignoring event from closed chat stream {}", generation);
            return false;
        };

        match event {
            ChatEvent::Chunk(chunk) => {
                if let Some(entry) = self.entries.get_mut(open.entry) {
                    entry.text.push_str(&chunk);
                }
            }
            ChatEvent::End => self.close(open),
            ChatEvent::Error(err) => {
                tracing::warn!("Chat stream failed: {}", err);
                if let Some(entry) = self.entries.get_mut(open.entry) {
                    entry.text.push_str(CONNECTION_ERROR_SUFFIX);
                }
                self.close(open);
            }
        }
        true
    }

    fn close(&mut self, open: OpenStream) {
        if let Some(entry) = self.entries.get_mut(open.entry) {
            entry.typing = false;
        }
        self.open = None;
        self.input_enabled = true;
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
