//! Everything a running viewer owns: the scene session, the panels and chat

use fleet_core::wire::EngineeringCommand;

use crate::chat::ChatSession;
use crate::config::DashboardConfig;
use crate::error::FleetResult;
use crate::http_adapter::DashboardClient;
use crate::panels::Panels;
use crate::poller::{PollOutcome, PollTarget};
use crate::session::SceneSession;

pub struct Dashboard {
    pub session: SceneSession,
    pub panels: Panels,
    pub chat: ChatSession,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, start_seconds: f64) -> Self {
        Self {
            session: SceneSession::new(start_seconds, config.orbit_rate),
            panels: Panels::new(),
            chat: ChatSession::new(),
        }
    }

    /// Load the texture catalog before the first snapshot arrives.
    ///
    /// Without it every body falls back to flat colours; that is not fatal.
    pub async fn bootstrap<C: DashboardClient>(&mut self, client: &C) {
        match client.texture_info().await {
            Ok(textures) => {
                tracing::info!("Loaded {} textures", textures.0.len());
                self.session.install_textures(textures);
            }
            Err(err) => tracing::warn!("Texture catalog unavailable, using flat colours: {}", err),
        }
    }

    pub fn apply(&mut self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::Telemetry(telemetry) => self.panels.apply_telemetry(telemetry),
            PollOutcome::StudioLog(entries) => self.panels.apply_studio_log(entries),
            PollOutcome::Orbital(snapshot) => {
                let dropped = snapshot.dropped;
                let report = self.session.apply_snapshot(snapshot);
                if !report.is_noop() || dropped > 0 {
                    tracing::info!(
                        "Snapshot: {} created, {} updated, {} removed, {} bulk, {} dropped",
                        report.created.len(),
                        report.updated,
                        report.removed.len(),
                        report.bulk,
                        dropped
                    );
                }
            }
            PollOutcome::PlottedPath(response) => {
                if let Some(update) = self.panels.apply_plotted_path(response) {
                    self.session.set_plotted_path(&update.id, &update.points);
                    self.panels.path_rendered(&update.id);
                }
            }
            PollOutcome::Engineering(metrics) => self.panels.apply_engineering(&metrics),
        }
    }

    /// Apply a poll result; failures only log and leave the previous state
    pub fn apply_result(&mut self, target: PollTarget, result: FleetResult<PollOutcome>) {
        match result {
            Ok(outcome) => self.apply(outcome),
            Err(err) => tracing::warn!("Error fetching {}: {}", target.path(), err),
        }
    }

    /// Send a plot request for the given input text, updating the status line
    pub async fn request_plot<C: DashboardClient>(&mut self, client: &C, input: &str) {
        if let Some(id) = self.panels.begin_plot(input) {
            let result = client.plot_object(&id).await;
            self.panels.finish_plot(result);
        }
    }

    /// Plot whatever the current selection prefilled
    pub async fn plot_selection<C: DashboardClient>(&mut self, client: &C) {
        let target = self.session.selection().plot_target.clone();
        self.request_plot(client, &target).await;
    }

    pub async fn send_command<C: DashboardClient>(
        &self,
        client: &C,
        command: &str,
        args: Vec<String>,
    ) -> FleetResult<serde_json::Value> {
        let command = EngineeringCommand {
            command: command.to_string(),
            args,
        };
        let result = client.engineering_command(&command).await;
        match &result {
            Ok(value) => tracing::info!("Command result: {}", value),
            Err(err) => tracing::warn!("Command error: {}", err),
        }
        result
    }
}
