//! Viewer engine shared by the native CLI and the WASM dashboard
//!
//! Polled backend data is reconciled into a retained scene graph; the camera
//! rig, picking and panels operate on that scene. Platform-specific pieces
//! (HTTP transport, timers) sit behind `DashboardClient` and the poller.

#![cfg_attr(target_arch = "wasm32", allow(clippy::unused_unit))]

pub mod camera;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event_stream;
pub mod http_adapter;
pub mod input;
pub mod panels;
pub mod picking;
pub mod poller;
pub mod reconcile;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod style;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export core types
pub use camera::{Camera, CameraMode, CameraRig, CameraUniform};
pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use error::{FleetError, FleetResult};
pub use http_adapter::DashboardClient;
pub use input::InputEvent;
pub use reconcile::{ReconcileReport, SceneRegistry};
pub use scene::{RetainedScene, SceneGraph};
pub use session::SceneSession;

#[cfg(not(target_arch = "wasm32"))]
pub use http_adapter::NativeHttpClient;
