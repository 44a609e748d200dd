//! WASM bindings for the browser viewer
//!
//! The host page owns the timers: it calls `poll(target)` from `setInterval`
//! and `tick(now)` from `requestAnimationFrame`, then draws the buffers this
//! module hands back. `now` is the `performance.now()` timestamp the frame
//! callback receives; the engine anchors its orbit clock on the same clock.

use std::cell::RefCell;
use std::rc::Rc;

use fleet_core::wire::{endpoints, ChatChunk, STREAM_END_EVENT};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::event_stream::ChatEvent;
use crate::http_adapter::WasmHttpClient;
use crate::input::parse_input;
use crate::poller::{self, PollTarget};
use crate::scene::Geometry;

/// Open chat `EventSource` plus the callbacks it references
struct ChatStream {
    source: web_sys::EventSource,
    _on_message: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _on_end: Closure<dyn FnMut(web_sys::Event)>,
    _on_error: Closure<dyn FnMut(web_sys::Event)>,
}

#[wasm_bindgen]
pub struct WasmEngine {
    dashboard: Rc<RefCell<Dashboard>>,
    client: WasmHttpClient,
    chat_stream: Rc<RefCell<Option<ChatStream>>>,
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// `performance.now()` in seconds, the clock `requestAnimationFrame` reports
fn now_seconds() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0)
}

fn parse_target(name: &str) -> Option<PollTarget> {
    match name {
        "telemetry" => Some(PollTarget::Telemetry),
        "studio_log" => Some(PollTarget::StudioLog),
        "orbital" => Some(PollTarget::Orbital),
        "plotted_path" => Some(PollTarget::PlottedPath),
        "engineering" => Some(PollTarget::Engineering),
        _ => None,
    }
}

#[wasm_bindgen]
impl WasmEngine {
    /// `config_json` is an optional `DashboardConfig` document
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmEngine, JsValue> {
        let config = match config_json {
            Some(json) => DashboardConfig::from_json_str(&json).map_err(js_error)?,
            None => DashboardConfig {
                base_url: String::new(),
                ..DashboardConfig::default()
            },
        };
        Ok(Self {
            dashboard: Rc::new(RefCell::new(Dashboard::new(&config, now_seconds()))),
            client: WasmHttpClient::new(&config.base_url),
            chat_stream: Rc::new(RefCell::new(None)),
        })
    }

    /// Fetch the texture catalog; resolves once the starfield (if any) is attached
    pub fn bootstrap(&self) -> js_sys::Promise {
        let dashboard = self.dashboard.clone();
        let client = self.client.clone();
        future_to_promise(async move {
            let textures = crate::http_adapter::DashboardClient::texture_info(&client).await;
            match textures {
                Ok(textures) => dashboard.borrow_mut().session.install_textures(textures),
                Err(err) => tracing::warn!("Texture catalog unavailable: {}", err),
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Fetch one poll target (`telemetry`, `studio_log`, `orbital`,
    /// `plotted_path`, `engineering`) and apply it
    pub fn poll(&self, target: &str) -> Result<js_sys::Promise, JsValue> {
        let target = parse_target(target)
            .ok_or_else(|| JsValue::from_str(&format!("unknown poll target {target}")))?;
        let dashboard = self.dashboard.clone();
        let client = self.client.clone();
        Ok(future_to_promise(async move {
            let result = poller::fetch(&client, target).await;
            dashboard.borrow_mut().apply_result(target, result);
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Advance one frame; `now_ms` is the `performance.now()` timestamp.
    /// Returns the camera uniform as floats.
    pub fn tick(&self, now_ms: f64) -> Vec<f32> {
        let mut dashboard = self.dashboard.borrow_mut();
        let frame = dashboard.session.tick(now_ms / 1000.0);
        bytemuck::cast_slice(&[frame.camera]).to_vec()
    }

    /// Instance matrices for the asteroid belt (16 floats per instance)
    pub fn instance_data(&self) -> Vec<f32> {
        bytemuck::cast_slice(self.dashboard.borrow().session.instances()).to_vec()
    }

    /// Apply a JSON `InputEvent`
    pub fn handle_input(&self, json: &str) -> Result<(), JsValue> {
        let event = parse_input(json).map_err(js_error)?;
        self.dashboard.borrow_mut().session.handle_input(event);
        Ok(())
    }

    /// Pick at a pixel position; returns the selected id
    pub fn click(&self, x: f64, y: f64) -> Option<String> {
        self.dashboard.borrow_mut().session.click(x, y)
    }

    pub fn selection_text(&self) -> String {
        self.dashboard.borrow().session.selection().panel_text()
    }

    pub fn selection_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.dashboard.borrow().session.selection()).map_err(js_error)
    }

    pub fn panels_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.dashboard.borrow().panels).map_err(js_error)
    }

    pub fn chat_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.dashboard.borrow().chat).map_err(js_error)
    }

    /// Visible scene nodes for the host's draw pass
    pub fn nodes_json(&self) -> Result<String, JsValue> {
        let dashboard = self.dashboard.borrow();
        let nodes: Vec<serde_json::Value> = dashboard
            .session
            .graph()
            .visible_nodes()
            .into_iter()
            .map(|(id, node)| {
                let spec = &node.spec;
                let t = &spec.transform;
                let kind = match &spec.geometry {
                    Geometry::Sphere { .. } => "sphere",
                    Geometry::Icosahedron { .. } => "icosahedron",
                    Geometry::Ring { .. } => "ring",
                    Geometry::Polyline { .. } => "line",
                    Geometry::BoxOutline => "box",
                    Geometry::Instanced { .. } => "instanced",
                };
                serde_json::json!({
                    "node": id,
                    "label": spec.label,
                    "geometry": kind,
                    "parent": spec.parent,
                    "position": [t.position.x, t.position.y, t.position.z],
                    "rotation": [t.rotation.x, t.rotation.y, t.rotation.z, t.rotation.w],
                    "scale": [t.scale.x, t.scale.y, t.scale.z],
                    "color": spec.material.color.hex(),
                    "map": spec.material.map,
                })
            })
            .collect();
        serde_json::to_string(&nodes).map_err(js_error)
    }

    /// Send the plot-target input text to the backend
    pub fn plot(&self, input: String) -> js_sys::Promise {
        let dashboard = self.dashboard.clone();
        let client = self.client.clone();
        future_to_promise(async move {
            let id = dashboard.borrow_mut().panels.begin_plot(&input);
            if let Some(id) = id {
                let result = crate::http_adapter::DashboardClient::plot_object(&client, &id).await;
                dashboard.borrow_mut().panels.finish_plot(result);
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Start a chat reply stream; the previous stream is closed first
    pub fn send_chat(&self, message: &str) -> Result<(), JsValue> {
        let Some(request) = self.dashboard.borrow_mut().chat.send(message) else {
            return Ok(());
        };

        if let Some(prev) = self.chat_stream.borrow_mut().take() {
            prev.source.close();
        }

        let encoded: String = js_sys::encode_uri_component(&request.message).into();
        let url = format!("{}?message={}", self.client.url(endpoints::STREAM_CHAT), encoded);
        let source = web_sys::EventSource::new(&url)?;
        let generation = request.generation;

        let on_message = {
            let dashboard = self.dashboard.clone();
            Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
                let Some(data) = event.data().as_string() else {
                    return;
                };
                match serde_json::from_str::<ChatChunk>(&data) {
                    Ok(chunk) => {
                        dashboard
                            .borrow_mut()
                            .chat
                            .on_event(generation, ChatEvent::Chunk(chunk.chunk));
                    }
                    Err(err) => tracing::warn!("Dropping malformed chat chunk: {}", err),
                }
            })
        };

        let on_end = {
            let dashboard = self.dashboard.clone();
            let source = source.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                source.close();
                dashboard.borrow_mut().chat.on_event(generation, ChatEvent::End);
            })
        };

        let on_error = {
            let dashboard = self.dashboard.clone();
            let source = source.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                source.close();
                dashboard
                    .borrow_mut()
                    .chat
                    .on_event(generation, ChatEvent::Error("EventSource failed".into()));
            })
        };

        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        source.add_event_listener_with_callback(STREAM_END_EVENT, on_end.as_ref().unchecked_ref())?;
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        *self.chat_stream.borrow_mut() = Some(ChatStream {
            source,
            _on_message: on_message,
            _on_end: on_end,
            _on_error: on_error,
        });
        Ok(())
    }

    /// Number of live scene nodes (diagnostics)
    pub fn node_count(&self) -> usize {
        self.dashboard.borrow().session.graph().len()
    }
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
