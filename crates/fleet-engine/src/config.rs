//! Viewer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FleetError, FleetResult};

/// Poll intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    pub telemetry_ms: u64,
    pub studio_log_ms: u64,
    pub orbital_ms: u64,
    pub plotted_path_ms: u64,
    /// Only polled when the engineering panel is enabled.
    pub engineering_ms: u64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            telemetry_ms: 3000,
            studio_log_ms: 5000,
            orbital_ms: 2000,
            plotted_path_ms: 1000,
            engineering_ms: 1000,
        }
    }
}

impl PollIntervals {
    pub fn telemetry(&self) -> Duration {
        Duration::from_millis(self.telemetry_ms)
    }

    pub fn studio_log(&self) -> Duration {
        Duration::from_millis(self.studio_log_ms)
    }

    pub fn orbital(&self) -> Duration {
        Duration::from_millis(self.orbital_ms)
    }

    pub fn plotted_path(&self) -> Duration {
        Duration::from_millis(self.plotted_path_ms)
    }

    pub fn engineering(&self) -> Duration {
        Duration::from_millis(self.engineering_ms)
    }
}

/// Viewer configuration, deserializable from JSON with every field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend origin, no trailing slash
    pub base_url: String,
    pub poll: PollIntervals,
    /// Poll `/daisy_engineering_metrics` as well
    pub engineering_panel: bool,
    /// Orbital time units per real second
    pub orbit_rate: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            poll: PollIntervals::default(),
            engineering_panel: false,
            orbit_rate: fleet_sim::rates::DASHBOARD,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> FleetResult<Self> {
        let mut cfg: DashboardConfig = serde_json::from_str(json)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a JSON config file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> FleetResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg = Self::from_json_str(&data)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn normalize(&mut self) {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }

    pub fn validate(&self) -> FleetResult<()> {
        if self.base_url.is_empty() {
            return Err(FleetError::Config("base_url must not be empty".into()));
        }
        let p = &self.poll;
        let intervals = [
            ("telemetry_ms", p.telemetry_ms),
            ("studio_log_ms", p.studio_log_ms),
            ("orbital_ms", p.orbital_ms),
            ("plotted_path_ms", p.plotted_path_ms),
            ("engineering_ms", p.engineering_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(FleetError::Config(format!("poll.{name} must be positive")));
        }
        if !self.orbit_rate.is_finite() {
            return Err(FleetError::Config("orbit_rate must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.base_url, "http://127.0.0.1:5001");
        assert_eq!(cfg.poll.telemetry(), Duration::from_secs(3));
        assert_eq!(cfg.poll.studio_log(), Duration::from_secs(5));
        assert_eq!(cfg.poll.orbital(), Duration::from_secs(2));
        assert_eq!(cfg.poll.plotted_path(), Duration::from_secs(1));
        assert!(!cfg.engineering_panel);
        assert!((cfg.orbit_rate - 0.1).abs() < 1e-12);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = DashboardConfig::from_json_str(
            r#"{ "base_url": "http://fleet.local:8080/", "poll": { "orbital_ms": 500 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://fleet.local:8080");
        assert_eq!(cfg.poll.orbital_ms, 500);
        assert_eq!(cfg.poll.telemetry_ms, 3000);
    }

    #[test]
    fn zero_interval_rejected() {
        let err = DashboardConfig::from_json_str(r#"{ "poll": { "telemetry_ms": 0 } }"#).unwrap_err();
        assert!(matches!(err, FleetError::Config(msg) if msg.contains("telemetry_ms")));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            DashboardConfig::from_json_str("{ nope"),
            Err(FleetError::Json(_))
        ));
    }
}
