//! Periodic backend polling
//!
//! Each target fires on its own fixed interval, the first time one full
//! interval after start. Fetches are independent: several may be in flight
//! at once and each result is applied as soon as it arrives, so the last
//! applied response wins.

use fleet_core::wire::{endpoints, EngineeringMetrics, PlottedPathResponse, StudioLogEntry, Telemetry};
use fleet_core::Snapshot;
use std::time::Duration;

use crate::config::DashboardConfig;
use crate::error::FleetResult;
use crate::http_adapter::DashboardClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollTarget {
    Telemetry,
    StudioLog,
    Orbital,
    PlottedPath,
    Engineering,
}

impl PollTarget {
    pub fn path(self) -> &'static str {
        match self {
            PollTarget::Telemetry => endpoints::TELEMETRY,
            PollTarget::StudioLog => endpoints::STUDIO_LOG,
            PollTarget::Orbital => endpoints::ORBITAL_DATA,
            PollTarget::PlottedPath => endpoints::PLOTTED_PATH,
            PollTarget::Engineering => endpoints::ENGINEERING_METRICS,
        }
    }
}

/// A decoded poll response
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Telemetry(Telemetry),
    StudioLog(Vec<StudioLogEntry>),
    Orbital(Snapshot),
    PlottedPath(PlottedPathResponse),
    Engineering(EngineeringMetrics),
}

/// Fetch and decode one poll target
pub async fn fetch<C: DashboardClient>(client: &C, target: PollTarget) -> FleetResult<PollOutcome> {
    Ok(match target {
        PollTarget::Telemetry => PollOutcome::Telemetry(client.telemetry().await?),
        PollTarget::StudioLog => PollOutcome::StudioLog(client.studio_log().await?),
        PollTarget::Orbital => PollOutcome::Orbital(client.orbital_snapshot().await?),
        PollTarget::PlottedPath => PollOutcome::PlottedPath(client.plotted_path().await?),
        PollTarget::Engineering => PollOutcome::Engineering(client.engineering_metrics().await?),
    })
}

#[derive(Clone, Debug)]
struct ScheduleEntry {
    target: PollTarget,
    period: Duration,
    /// Offset from start of the next fetch
    next_due: Duration,
}

/// Fixed-interval timetable, expressed as offsets from the poller start.
#[derive(Clone, Debug)]
pub struct PollSchedule {
    entries: Vec<ScheduleEntry>,
}

impl PollSchedule {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        let poll = &config.poll;
        let mut schedule = Self::new()
            .every(PollTarget::Telemetry, poll.telemetry())
            .every(PollTarget::StudioLog, poll.studio_log())
            .every(PollTarget::Orbital, poll.orbital())
            .every(PollTarget::PlottedPath, poll.plotted_path());
        if config.engineering_panel {
            schedule = schedule.every(PollTarget::Engineering, poll.engineering());
        }
        schedule
    }

    /// Add a target; zero periods are ignored
    pub fn every(mut self, target: PollTarget, period: Duration) -> Self {
        if period.is_zero() {
            tracing::warn!("Ignoring zero poll interval for {}", target.path());
            return self;
        }
        self.entries.push(ScheduleEntry {
            target,
            period,
            next_due: period,
        });
        self
    }

    pub fn targets(&self) -> Vec<PollTarget> {
        self.entries.iter().map(|e| e.target).collect()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.next_due).min()
    }

    /// Targets due at `elapsed`, advancing each past it.
    ///
    /// A target that missed several beats fires once.
    pub fn take_due(&mut self, elapsed: Duration) -> Vec<PollTarget> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if entry.next_due <= elapsed {
                due.push(entry.target);
                while entry.next_due <= elapsed {
                    entry.next_due += entry.period;
                }
            }
        }
        due
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{run_poller, PollStats, PollerOptions};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use crate::dashboard::Dashboard;
    use futures::future::LocalBoxFuture;
    use futures::stream::FuturesUnordered;
    use futures::{FutureExt, StreamExt};
    use std::collections::HashMap;
    use tokio::time::{sleep_until, Instant};

    #[derive(Clone, Copy, Debug, Default)]
    pub struct PollerOptions {
        /// Stop after this long; `None` runs until the schedule is empty
        pub run_for: Option<Duration>,
        /// Animation tick period; `None` disables ticking
        pub frame_interval: Option<Duration>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct PollStats {
        pub fetched: HashMap<PollTarget, usize>,
        pub failed: usize,
        pub frames: usize,
    }

    impl PollStats {
        pub fn count(&self, target: PollTarget) -> usize {
            self.fetched.get(&target).copied().unwrap_or(0)
        }
    }

    type InFlight<'a> = LocalBoxFuture<'a, (PollTarget, FleetResult<PollOutcome>)>;

    /// Drive the schedule on the current task.
    ///
    /// Timers and in-flight fetches are multiplexed with `select!`; results are
    /// applied to `dashboard` in completion order.
    pub async fn run_poller<C: DashboardClient>(
        client: &C,
        dashboard: &mut Dashboard,
        mut schedule: PollSchedule,
        options: PollerOptions,
    ) -> PollStats {
        let start = Instant::now();
        let deadline = options.run_for.map(|d| start + d);
        let mut next_frame = options.frame_interval.map(|d| start + d);
        let mut in_flight: FuturesUnordered<InFlight<'_>> = FuturesUnordered::new();
        let mut stats = PollStats::default();

        tracing::info!("Polling {:?}", schedule.targets());

        loop {
            let Some(next_poll) = schedule.next_due().map(|d| start + d) else {
                break;
            };

            tokio::select! {
                _ = sleep_until(next_poll) => {
                    for target in schedule.take_due(Instant::now() - start) {
                        let fut = async move { (target, fetch(client, target).await) };
                        in_flight.push(fut.boxed_local());
                    }
                }

                Some((target, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    if result.is_err() {
                        stats.failed += 1;
                    }
                    *stats.fetched.entry(target).or_insert(0) += 1;
                    dashboard.apply_result(target, result);
                }

                _ = sleep_or_pending(next_frame) => {
                    let now = Instant::now();
                    dashboard.session.tick((now - start).as_secs_f64());
                    stats.frames += 1;
                    next_frame = options.frame_interval.map(|d| now + d);
                }

                _ = sleep_or_pending(deadline) => {
                    tracing::info!("Poller stopped after {:?}", start.elapsed());
                    break;
                }
            }
        }

        stats
    }

    async fn sleep_or_pending(at: Option<Instant>) {
        match at {
            Some(at) => sleep_until(at).await,
            None => futures::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_adapter::DashboardClient;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_default_schedule_first_beats() {
        let mut schedule = PollSchedule::default();
        assert_eq!(schedule.targets().len(), 4);
        assert_eq!(schedule.next_due(), Some(ms(1000)));

        assert_eq!(schedule.take_due(ms(1000)), vec![PollTarget::PlottedPath]);
        assert_eq!(
            schedule.take_due(ms(2000)),
            vec![PollTarget::Orbital, PollTarget::PlottedPath]
        );
        assert_eq!(
            schedule.take_due(ms(3000)),
            vec![PollTarget::Telemetry, PollTarget::PlottedPath]
        );
        assert_eq!(schedule.next_due(), Some(ms(4000)));
    }

    #[test]
    fn test_missed_beats_fire_once() {
        let mut schedule = PollSchedule::new().every(PollTarget::PlottedPath, ms(1000));
        assert_eq!(schedule.take_due(ms(4500)), vec![PollTarget::PlottedPath]);
        assert_eq!(schedule.next_due(), Some(ms(5000)));
    }

    #[test]
    fn test_engineering_only_when_enabled() {
        let mut config = DashboardConfig::default();
        assert!(!PollSchedule::from_config(&config)
            .targets()
            .contains(&PollTarget::Engineering));

        config.engineering_panel = true;
        assert!(PollSchedule::from_config(&config)
            .targets()
            .contains(&PollTarget::Engineering));
    }

    /// Serves canned bodies and counts requests per path
    #[derive(Default)]
    struct FakeClient {
        bodies: HashMap<&'static str, String>,
        calls: RefCell<HashMap<String, usize>>,
    }

    impl FakeClient {
        fn standard() -> Self {
            let mut bodies = HashMap::new();
            bodies.insert(
                endpoints::TELEMETRY,
                r#"{"fleet_status":{"ai_status":"Online","active_satellites":3,"tracking_neos":1}}"#
                    .to_string(),
            );
            bodies.insert(
                endpoints::STUDIO_LOG,
                r#"[{"speaker":"Vespera","message":"Tracking nominal"}]"#.to_string(),
            );
            bodies.insert(
                endpoints::ORBITAL_DATA,
                r#"[{"id":"earth","type":"planet","size":5,"position":{"x":150,"y":0,"z":0}},
                    {"id":"asteroid_0","type":"asteroid","size":0.2,
                     "orbital_elements":{"semi_major_axis":2.5,"eccentricity":0.1,"inclination":0.0,
                                         "mean_anomaly":0.0,"period":3.95}}]"#
                    .to_string(),
            );
            bodies.insert(endpoints::PLOTTED_PATH, "{}".to_string());
            Self {
                bodies,
                calls: RefCell::new(HashMap::new()),
            }
        }

        fn calls(&self, path: &str) -> usize {
            self.calls.borrow().get(path).copied().unwrap_or(0)
        }
    }

    impl DashboardClient for FakeClient {
        async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FleetResult<T> {
            *self.calls.borrow_mut().entry(path.to_string()).or_insert(0) += 1;
            let body = self
                .bodies
                .get(path)
                .ok_or_else(|| crate::error::FleetError::Status {
                    status: 404,
                    path: path.to_string(),
                })?;
            Ok(serde_json::from_str(body)?)
        }

        async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> FleetResult<T> {
            *self.calls.borrow_mut().entry(path.to_string()).or_insert(0) += 1;
            let echoed = serde_json::to_string(body)?;
            match self.bodies.get(path) {
                Some(reply) => Ok(serde_json::from_str(reply)?),
                None => Ok(serde_json::from_str(&echoed)?),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_fires_on_fixed_intervals() {
        let client = FakeClient::standard();
        let mut dashboard = crate::dashboard::Dashboard::new(&DashboardConfig::default(), 0.0);

        let stats = run_poller(
            &client,
            &mut dashboard,
            PollSchedule::default(),
            PollerOptions {
                run_for: Some(ms(6500)),
                frame_interval: None,
            },
        )
        .await;

        assert_eq!(client.calls(endpoints::TELEMETRY), 2);
        assert_eq!(client.calls(endpoints::STUDIO_LOG), 1);
        assert_eq!(client.calls(endpoints::ORBITAL_DATA), 3);
        assert_eq!(client.calls(endpoints::PLOTTED_PATH), 6);
        assert_eq!(stats.count(PollTarget::PlottedPath), 6);
        assert_eq!(stats.failed, 0);

        assert_eq!(dashboard.panels.fleet.ai_status, "Online");
        assert_eq!(dashboard.panels.studio_log.len(), 1);
        assert!(dashboard.session.registry().contains("earth"));
        assert_eq!(dashboard.session.bulk().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_polls_leave_state_stale() {
        let mut client = FakeClient::standard();
        let mut dashboard = crate::dashboard::Dashboard::new(&DashboardConfig::default(), 0.0);

        let orbital_only = || PollSchedule::new().every(PollTarget::Orbital, ms(2000));
        let options = PollerOptions {
            run_for: Some(ms(2500)),
            frame_interval: None,
        };

        run_poller(&client, &mut dashboard, orbital_only(), options).await;
        assert!(dashboard.session.registry().contains("earth"));

        client.bodies.remove(endpoints::ORBITAL_DATA);
        let stats = run_poller(&client, &mut dashboard, orbital_only(), options).await;

        assert_eq!(stats.failed, 1);
        assert!(dashboard.session.registry().contains("earth"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_tick_independently() {
        let client = FakeClient::standard();
        let mut dashboard = crate::dashboard::Dashboard::new(&DashboardConfig::default(), 0.0);

        let stats = run_poller(
            &client,
            &mut dashboard,
            PollSchedule::new().every(PollTarget::Orbital, ms(2000)),
            PollerOptions {
                run_for: Some(ms(1050)),
                frame_interval: Some(ms(100)),
            },
        )
        .await;

        assert_eq!(stats.frames, 10);
        assert_eq!(stats.count(PollTarget::Orbital), 0);
    }
}
