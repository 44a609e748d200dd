//! Input event protocol shared by the browser glue and the native CLI

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Input event from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    /// Mouse button; any button starts/stops drag-look
    MouseButton { button: u8, pressed: bool },

    /// Mouse movement (delta, pixels)
    MouseMove { dx: f64, dy: f64 },

    /// Wheel delta (DOM `deltaY` convention: positive scrolls away)
    Scroll { delta: f64 },

    /// Key press/release (DOM `KeyboardEvent.code`)
    Key { code: String, pressed: bool },

    /// Click at a pixel position inside the viewport
    Click { x: f64, y: f64 },

    /// Follow an object by id
    Track { id: String },

    /// Return the camera to its home position
    Home,

    /// Viewport resized (pixels)
    Resize { width: f64, height: f64 },

    /// Orbital time units per real second
    SetTimeRate { rate: f64 },
}

/// Parse input event from JSON
pub fn parse_input(json: &str) -> Result<InputEvent, serde_json::Error> {
    serde_json::from_str(json)
}

/// Drawing surface size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Pixel position (origin top-left, y down) to normalized device coordinates
    pub fn to_ndc(&self, x: f64, y: f64) -> DVec2 {
        DVec2::new(x / self.width * 2.0 - 1.0, -(y / self.height) * 2.0 + 1.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}
