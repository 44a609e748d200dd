//! Request/response bodies of the dashboard backend

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::coordinates::WirePosition;

/// Backend routes consumed by the viewer
pub mod endpoints {
    pub const TELEMETRY: &str = "/telemetry";
    pub const STUDIO_LOG: &str = "/get_studio_log";
    pub const ORBITAL_DATA: &str = "/orbitaldata";
    pub const PLOTTED_PATH: &str = "/get_plotted_path";
    pub const PLOT_OBJECT: &str = "/plot_object";
    pub const TEXTURE_INFO: &str = "/get_texture_info";
    pub const ENGINEERING_METRICS: &str = "/daisy_engineering_metrics";
    pub const ENGINEERING_COMMAND: &str = "/daisy_engineering_command";
    pub const STREAM_CHAT: &str = "/stream_chat";
}

/// Event name that terminates a chat stream
pub const STREAM_END_EVENT: &str = "stream-end";

/// `GET /telemetry`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub fleet_status: FleetStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetStatus {
    #[serde(default = "FleetStatus::offline", deserialize_with = "ai_status_or_offline")]
    pub ai_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_satellites: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracking_neos: u32,
}

impl FleetStatus {
    fn offline() -> String {
        "Offline".to_string()
    }
}

/// `null` reads as the field's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` or an empty status shows as offline
fn ai_status_or_offline<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let status = Option::<String>::deserialize(deserializer)?;
    Ok(status
        .filter(|s| !s.is_empty())
        .unwrap_or_else(FleetStatus::offline))
}

impl Default for FleetStatus {
    fn default() -> Self {
        Self {
            ai_status: Self::offline(),
            active_satellites: 0,
            tracking_neos: 0,
        }
    }
}

/// One entry of `GET /get_studio_log`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioLogEntry {
    pub speaker: String,
    pub message: String,
}

/// `GET /get_plotted_path`.
///
/// Variant order matters: a status message wins over a path, and an empty
/// object (nothing plotted yet) falls through to `Idle`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlottedPathResponse {
    Status {
        message: String,
    },
    Path {
        path: Vec<WirePosition>,
        #[serde(default)]
        id: String,
    },
    Failed {
        error: String,
    },
    Idle {},
}

/// `POST /plot_object` body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotRequest {
    pub id: String,
}

/// `POST /plot_object` response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl PlotResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// `GET /get_texture_info`: object id to texture URL
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureCatalog(pub HashMap<String, String>);

impl TextureCatalog {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, url: impl Into<String>) {
        self.0.insert(key.into(), url.into());
    }
}

/// A single engineering reading (`{ "value": .. }`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
}

/// `GET /daisy_engineering_metrics`; only the fields the panel shows are typed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineeringMetrics {
    #[serde(default)]
    pub propulsion_data: PropulsionData,
    #[serde(default)]
    pub subsystems_data: SubsystemsData,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropulsionData {
    #[serde(default)]
    pub warp_speed: Option<Reading>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsystemsData {
    #[serde(default)]
    pub warp_core: WarpCore,
    #[serde(default)]
    pub plasma_injectors: PlasmaInjectors,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WarpCore {
    #[serde(default)]
    pub core_temperature: Option<Reading>,
    #[serde(default)]
    pub warp_field_strength: Option<Reading>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlasmaInjectors {
    #[serde(default)]
    pub injection_rate: Option<Reading>,
}

/// `POST /daisy_engineering_command` body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineeringCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Payload of one chat stream message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub chunk: String,
}
