//! Backend fetch adapters
//!
//! Native builds talk to the dashboard backend through reqwest.
//! WASM builds use the browser fetch API (async).

use fleet_core::wire::{
    endpoints, EngineeringCommand, EngineeringMetrics, PlotRequest, PlotResponse,
    PlottedPathResponse, StudioLogEntry, Telemetry, TextureCatalog,
};
use fleet_core::Snapshot;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FleetResult;

/// Transport-agnostic access to the dashboard backend.
///
/// Both adapters run on a single-threaded executor, so the returned futures
/// are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait DashboardClient {
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FleetResult<T>;

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> FleetResult<T>;

    async fn telemetry(&self) -> FleetResult<Telemetry> {
        self.get_json(endpoints::TELEMETRY).await
    }

    async fn studio_log(&self) -> FleetResult<Vec<StudioLogEntry>> {
        self.get_json(endpoints::STUDIO_LOG).await
    }

    async fn orbital_snapshot(&self) -> FleetResult<Snapshot> {
        let raw: Vec<serde_json::Value> = self.get_json(endpoints::ORBITAL_DATA).await?;
        Ok(Snapshot::from_values(raw))
    }

    async fn plotted_path(&self) -> FleetResult<PlottedPathResponse> {
        self.get_json(endpoints::PLOTTED_PATH).await
    }

    async fn plot_object(&self, id: &str) -> FleetResult<PlotResponse> {
        let body = PlotRequest { id: id.to_string() };
        self.post_json(endpoints::PLOT_OBJECT, &body).await
    }

    async fn texture_info(&self) -> FleetResult<TextureCatalog> {
        self.get_json(endpoints::TEXTURE_INFO).await
    }

    async fn engineering_metrics(&self) -> FleetResult<EngineeringMetrics> {
        self.get_json(endpoints::ENGINEERING_METRICS).await
    }

    /// The command result shape is backend-defined, so it stays untyped
    async fn engineering_command(&self, command: &EngineeringCommand) -> FleetResult<serde_json::Value> {
        self.post_json(endpoints::ENGINEERING_COMMAND, command).await
    }
}

// -----------------------------
// Native (reqwest) adapter
// -----------------------------

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeHttpClient;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use crate::error::FleetError;
    use crate::event_stream::{ChatEvent, SseParser};
    use futures::StreamExt;
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// reqwest-backed client for the native CLI
    #[derive(Clone, Debug)]
    pub struct NativeHttpClient {
        base_url: String,
        client: reqwest::Client,
    }

    impl NativeHttpClient {
        pub fn new(base_url: &str) -> FleetResult<Self> {
            let client = reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()?;
            Ok(Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> FleetResult<T> {
            let status = resp.status();
            if !status.is_success() {
                return Err(FleetError::Status {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }
            let text = resp.text().await?;
            Ok(serde_json::from_str(&text)?)
        }

        /// Stream a chat reply, feeding every event to `on_event` until the
        /// stream ends. A stream that closes without `stream-end` is an error.
        pub async fn stream_chat<F>(&self, message: &str, mut on_event: F) -> FleetResult<()>
        where
            F: FnMut(ChatEvent),
        {
            let resp = self
                .client
                .get(self.url(endpoints::STREAM_CHAT))
                .query(&[("message", message)])
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(FleetError::Status {
                    status: resp.status().as_u16(),
                    path: endpoints::STREAM_CHAT.to_string(),
                });
            }

            let mut parser = SseParser::new();
            let mut body = resp.bytes_stream();

            while let Some(chunk) = body.next().await {
                parser.push(&chunk?);
                for event in parser.drain_events() {
                    match event.to_chat_event() {
                        Some(ChatEvent::End) => {
                            on_event(ChatEvent::End);
                            return Ok(());
                        }
                        Some(other) => on_event(other),
                        None => {}
                    }
                }
            }

            Err(FleetError::Stream("chat stream closed before stream-end".into()))
        }
    }

    impl DashboardClient for NativeHttpClient {
        async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FleetResult<T> {
            tracing::trace!("GET {}", path);
            let resp = self
                .client
                .get(self.url(path))
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?;
            Self::decode(path, resp).await
        }

        async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> FleetResult<T> {
            tracing::trace!("POST {}", path);
            let resp = self
                .client
                .post(self.url(path))
                .timeout(REQUEST_TIMEOUT)
                .json(body)
                .send()
                .await?;
            Self::decode(path, resp).await
        }
    }
}

// -----------------------------
// WASM (fetch) adapter
// -----------------------------

/// Browser fetch client
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct WasmHttpClient {
    base_url: String,
}

#[cfg(target_arch = "wasm32")]
impl WasmHttpClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(target_arch = "wasm32")]
impl DashboardClient for WasmHttpClient {
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FleetResult<T> {
        let text = fetch_text(&self.url(path), path, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> FleetResult<T> {
        let body = serde_json::to_string(body)?;
        let text = fetch_text(&self.url(path), path, Some(&body)).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str, path: &str, json_body: Option<&str>) -> FleetResult<String> {
    use crate::error::FleetError;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let win = web_sys::window().ok_or_else(|| FleetError::Js("no window".into()))?;

    let opts = web_sys::RequestInit::new();
    match json_body {
        Some(body) => {
            opts.set_method("POST");
            opts.set_body(&JsValue::from_str(body));
        }
        None => opts.set_method("GET"),
    }
    let request = web_sys::Request::new_with_str_and_init(url, &opts)?;
    if json_body.is_some() {
        request.headers().set("Content-Type", "application/json")?;
    }

    let resp_val = JsFuture::from(win.fetch_with_request(&request)).await?;
    let resp: web_sys::Response = resp_val.dyn_into()?;

    if !resp.ok() {
        return Err(FleetError::Status {
            status: resp.status(),
            path: path.to_string(),
        });
    }

    let text_val = JsFuture::from(resp.text()?).await?;
    text_val
        .as_string()
        .ok_or_else(|| FleetError::Js("response.text() was not a string".into()))
}
