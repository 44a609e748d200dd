//! Dashboard panel state fed by the poller

use fleet_core::wire::{
    EngineeringMetrics, FleetStatus, PlotResponse, PlottedPathResponse, StudioLogEntry, Telemetry,
};
use fleet_core::WirePosition;
use serde::Serialize;

use crate::error::FleetResult;

/// Colour class of the plot status line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Error,
    Success,
    Info,
}

impl StatusTone {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("error") {
            StatusTone::Error
        } else if ["complete", "success", "render"].iter().any(|k| lower.contains(k)) {
            StatusTone::Success
        } else {
            StatusTone::Info
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            StatusTone::Error => "#ff6b6b",
            StatusTone::Success => "#1dd1a1",
            StatusTone::Info => "#48dbfb",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotStatus {
    pub text: String,
    pub tone: StatusTone,
    /// CSS colour the host paints the status line with
    pub color: &'static str,
}

impl PlotStatus {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tone = StatusTone::classify(&text);
        Self {
            text,
            tone,
            color: tone.css_color(),
        }
    }
}

/// Engineering alarm state; warp speed takes precedence over temperature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EngineeringAlarm {
    Nominal,
    StructuralIntegrity,
    CoreTemperature,
}

pub const WARP_SPEED_LIMIT: f64 = 9.0;
pub const CORE_TEMPERATURE_LIMIT: f64 = 700.0;

impl EngineeringAlarm {
    pub fn evaluate(warp_speed: Option<f64>, core_temperature: Option<f64>) -> Self {
        if warp_speed.is_some_and(|w| w > WARP_SPEED_LIMIT) {
            EngineeringAlarm::StructuralIntegrity
        } else if core_temperature.is_some_and(|t| t > CORE_TEMPERATURE_LIMIT) {
            EngineeringAlarm::CoreTemperature
        } else {
            EngineeringAlarm::Nominal
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            EngineeringAlarm::Nominal => "Systems Nominal",
            EngineeringAlarm::StructuralIntegrity => "DANGER: Structural Integrity at Risk!",
            EngineeringAlarm::CoreTemperature => "DANGER: Core Temperature Critical!",
        }
    }

    pub fn is_danger(self) -> bool {
        self != EngineeringAlarm::Nominal
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineeringReadout {
    pub warp_speed: Option<f64>,
    pub core_temperature: Option<f64>,
    pub injection_rate: Option<f64>,
    pub field_strength: Option<f64>,
    pub alarm: EngineeringAlarm,
}

impl EngineeringReadout {
    pub fn from_metrics(metrics: &EngineeringMetrics) -> Self {
        let core = &metrics.subsystems_data.warp_core;
        let warp_speed = metrics.propulsion_data.warp_speed.map(|r| r.value);
        let core_temperature = core.core_temperature.map(|r| r.value);
        Self {
            warp_speed,
            core_temperature,
            injection_rate: metrics
                .subsystems_data
                .plasma_injectors
                .injection_rate
                .map(|r| r.value),
            field_strength: core.warp_field_strength.map(|r| r.value),
            alarm: EngineeringAlarm::evaluate(warp_speed, core_temperature),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        fn show(v: Option<f64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_else(|| "--".to_string())
        }
        vec![
            format!("Warp: {}", show(self.warp_speed)),
            format!("Core Temp: {}°K", show(self.core_temperature)),
            format!("Plasma: {} mg/s", show(self.injection_rate)),
            format!("Field Strength: {}%", show(self.field_strength)),
            self.alarm.message().to_string(),
        ]
    }
}

/// A path the scene should draw, taken from a plotted-path poll
#[derive(Clone, Debug, PartialEq)]
pub struct PathUpdate {
    pub id: String,
    pub points: Vec<WirePosition>,
}

/// All non-3D panel state
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Panels {
    pub fleet: FleetStatus,
    pub studio_log: Vec<StudioLogEntry>,
    pub plot_status: Option<PlotStatus>,
    pub engineering: Option<EngineeringReadout>,
}

impl Panels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        let status = PlotStatus::new(text);
        tracing::info!("Plot status: {}", status.text);
        self.plot_status = Some(status);
    }

    pub fn status_text(&self) -> Option<&str> {
        self.plot_status.as_ref().map(|s| s.text.as_str())
    }

    pub fn apply_telemetry(&mut self, telemetry: Telemetry) {
        self.fleet = telemetry.fleet_status;
    }

    pub fn apply_studio_log(&mut self, entries: Vec<StudioLogEntry>) {
        self.studio_log = entries;
    }

    pub fn apply_engineering(&mut self, metrics: &EngineeringMetrics) {
        let readout = EngineeringReadout::from_metrics(metrics);
        let was_danger = self.engineering.as_ref().is_some_and(|e| e.alarm.is_danger());
        if readout.alarm.is_danger() && !was_danger {
            tracing::warn!("{}", readout.alarm.message());
        }
        self.engineering = Some(readout);
    }

    /// Route a plotted-path poll: status text lands here, a non-empty path is
    /// handed back for the scene to draw
    pub fn apply_plotted_path(&mut self, response: PlottedPathResponse) -> Option<PathUpdate> {
        match response {
            PlottedPathResponse::Status { message } => {
                self.set_status(message);
                None
            }
            PlottedPathResponse::Failed { error } => {
                self.set_status(format!("Error: {error}"));
                None
            }
            PlottedPathResponse::Path { path, id } if !path.is_empty() => {
                self.set_status(format!("Path received for {id}. Rendering..."));
                Some(PathUpdate { id, points: path })
            }
            PlottedPathResponse::Path { .. } | PlottedPathResponse::Idle {} => None,
        }
    }

    pub fn path_rendered(&mut self, id: &str) {
        self.set_status(format!("Render complete for {id}."));
    }

    /// Validate the plot-target input; returns the id to send
    pub fn begin_plot(&mut self, input: &str) -> Option<String> {
        let id = input.trim();
        if id.is_empty() {
            self.set_status("Error: Please enter an object name.");
            return None;
        }
        self.set_status(format!("Sending plot request for {id}..."));
        Some(id.to_string())
    }

    pub fn finish_plot(&mut self, result: FleetResult<PlotResponse>) {
        match result {
            Ok(response) if response.is_ok() => {}
            Ok(response) => {
                let message = response.message.unwrap_or_default();
                self.set_status(format!("Error: {message}"));
            }
            Err(err) => {
                tracing::warn!("Plot request failed: {}", err);
                self.set_status("Error: Could not connect to server.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FleetError;
    use fleet_core::wire::Reading;

    #[test]
    fn test_tone_classification() {
        assert_eq!(StatusTone::classify("Error: boom"), StatusTone::Error);
        assert_eq!(StatusTone::classify("network ERROR"), StatusTone::Error);
        assert_eq!(StatusTone::classify("Render complete for mars."), StatusTone::Success);
        assert_eq!(StatusTone::classify("Path received for mars. Rendering..."), StatusTone::Success);
        assert_eq!(StatusTone::classify("Upload SUCCESS"), StatusTone::Success);
        assert_eq!(StatusTone::classify("Sending plot request for mars..."), StatusTone::Info);
        // Error wins over success words
        assert_eq!(StatusTone::classify("render error"), StatusTone::Error);
    }

    #[test]
    fn test_status_color_follows_tone() {
        let mut panels = Panels::new();
        panels.set_status("Error: Object not found");
        let status = panels.plot_status.as_ref().unwrap();
        assert_eq!(status.color, "#ff6b6b");

        panels.set_status("Render complete for mars.");
        let json = serde_json::to_value(&panels).unwrap();
        assert_eq!(json["plot_status"]["color"], "#1dd1a1");
        assert_eq!(json["plot_status"]["tone"], "success");
    }

    #[test]
    fn test_plot_request_flow() {
        let mut panels = Panels::new();

        assert_eq!(panels.begin_plot("   "), None);
        assert_eq!(panels.status_text(), Some("Error: Please enter an object name."));
        assert_eq!(panels.plot_status.as_ref().unwrap().tone, StatusTone::Error);

        assert_eq!(panels.begin_plot("mars"), Some("mars".to_string()));
        assert_eq!(panels.status_text(), Some("Sending plot request for mars..."));

        panels.finish_plot(Ok(PlotResponse {
            status: "error".into(),
            message: Some("Unknown object".into()),
        }));
        assert_eq!(panels.status_text(), Some("Error: Unknown object"));

        panels.finish_plot(Err(FleetError::Http("connection refused".into())));
        assert_eq!(panels.status_text(), Some("Error: Could not connect to server."));
    }

    #[test]
    fn test_ok_plot_keeps_status() {
        let mut panels = Panels::new();
        panels.begin_plot("mars");
        panels.finish_plot(Ok(PlotResponse {
            status: "ok".into(),
            message: None,
        }));
        assert_eq!(panels.status_text(), Some("Sending plot request for mars..."));
    }

    #[test]
    fn test_plotted_path_routing() {
        let mut panels = Panels::new();

        let update = panels.apply_plotted_path(PlottedPathResponse::Path {
            path: vec![WirePosition::new(0.0, 0.0, 0.0), WirePosition::new(1.0, 2.0, 3.0)],
            id: "mars".into(),
        });
        assert_eq!(update.unwrap().points.len(), 2);
        assert_eq!(panels.status_text(), Some("Path received for mars. Rendering..."));

        panels.path_rendered("mars");
        assert_eq!(panels.status_text(), Some("Render complete for mars."));

        assert!(panels
            .apply_plotted_path(PlottedPathResponse::Failed { error: "no solution".into() })
            .is_none());
        assert_eq!(panels.status_text(), Some("Error: no solution"));

        assert!(panels
            .apply_plotted_path(PlottedPathResponse::Status { message: "Calculating...".into() })
            .is_none());
        assert_eq!(panels.plot_status.as_ref().unwrap().tone, StatusTone::Info);

        let before = panels.clone();
        assert!(panels.apply_plotted_path(PlottedPathResponse::Idle {}).is_none());
        assert!(panels
            .apply_plotted_path(PlottedPathResponse::Path { path: vec![], id: String::new() })
            .is_none());
        assert_eq!(panels, before);
    }

    fn metrics(warp: f64, temp: f64) -> EngineeringMetrics {
        let mut m = EngineeringMetrics::default();
        m.propulsion_data.warp_speed = Some(Reading { value: warp });
        m.subsystems_data.warp_core.core_temperature = Some(Reading { value: temp });
        m
    }

    #[test]
    fn test_engineering_alarm() {
        let mut panels = Panels::new();

        panels.apply_engineering(&metrics(5.0, 500.0));
        assert_eq!(panels.engineering.as_ref().unwrap().alarm, EngineeringAlarm::Nominal);

        panels.apply_engineering(&metrics(9.5, 800.0));
        assert_eq!(
            panels.engineering.as_ref().unwrap().alarm.message(),
            "DANGER: Structural Integrity at Risk!"
        );

        panels.apply_engineering(&metrics(9.0, 701.0));
        assert_eq!(
            panels.engineering.as_ref().unwrap().alarm,
            EngineeringAlarm::CoreTemperature
        );
    }

    #[test]
    fn test_engineering_lines_tolerate_missing_readings() {
        let readout = EngineeringReadout::from_metrics(&EngineeringMetrics::default());
        assert_eq!(readout.alarm, EngineeringAlarm::Nominal);
        assert_eq!(readout.lines()[0], "Warp: --");
        assert_eq!(readout.lines()[4], "Systems Nominal");
    }

    #[test]
    fn test_telemetry_and_log_replace() {
        let mut panels = Panels::new();
        assert_eq!(panels.fleet.ai_status, "Offline");

        panels.apply_studio_log(vec![StudioLogEntry {
            speaker: "Vespera".into(),
            message: "hello".into(),
        }]);
        panels.apply_studio_log(vec![]);
        assert!(panels.studio_log.is_empty());
    }
}
