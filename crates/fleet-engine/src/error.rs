//! Error types for the viewer engine

use thiserror::Error;

/// Result type for engine operations
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors that can occur while talking to the dashboard backend
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status} from {path}")]
    Status { status: u16, path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for FleetError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FleetError::Status {
                status: status.as_u16(),
                path: err.url().map(|u| u.path().to_string()).unwrap_or_default(),
            },
            None => FleetError::Http(err.to_string()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for FleetError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        FleetError::Js(format!("{:?}", value))
    }
}
