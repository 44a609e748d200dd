use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::constants::SCENE_SCALE_AU;
use fleet_core::AsteroidOrbitalElement;
use fleet_engine::chat::ChatSession;
use fleet_engine::config::DashboardConfig;
use fleet_engine::poller::{run_poller, PollSchedule, PollerOptions};
use fleet_engine::{Dashboard, NativeHttpClient};
use fleet_sim::{generate_belt, BeltConfig, OrbitModel};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetbridge")]
#[command(about = "FleetBridge telemetry viewer")]
struct Cli {
    /// JSON config file (DashboardConfig)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Poll engineering metrics as well
    #[arg(long, global = true)]
    engineering: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the backend and keep a headless scene up to date
    Watch {
        /// How long to run (seconds)
        #[arg(short, long, default_value = "30")]
        duration: f64,
        /// Animation tick period (milliseconds); 0 disables ticking
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },

    /// Print the propagated position of one asteroid
    Propagate {
        /// Semi-major axis (AU)
        #[arg(short = 'a', long)]
        semi_major_axis: f64,
        #[arg(short, long, default_value = "0")]
        eccentricity: f64,
        /// Inclination (degrees)
        #[arg(short, long, default_value = "0")]
        inclination: f64,
        /// Mean anomaly at epoch (degrees)
        #[arg(short, long, default_value = "0")]
        mean_anomaly: f64,
        /// Orbital period; defaults to sqrt(a^3)
        #[arg(short, long)]
        period: Option<f64>,
        /// Orbital time to evaluate at
        #[arg(short, long, default_value = "0")]
        time: f64,
    },

    /// Generate a synthetic asteroid belt as snapshot JSON
    Belt {
        #[arg(short, long, default_value = "500")]
        count: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask the backend to plot a course to an object
    Plot {
        id: String,
    },

    /// Stream a chat reply to stdout
    Chat {
        message: String,
    },

    /// Send an engineering command
    Command {
        command: String,
        args: Vec<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if cli.engineering {
        config.engineering_panel = true;
    }
    config.normalize();
    config.validate().context("Invalid configuration")?;
    tracing::debug!("Config: {:?}", config);
    Ok(config)
}

/// Human-readable summary of the panels and scene after a watch run
fn dashboard_report(dashboard: &Dashboard) -> Vec<String> {
    let mut out = Vec::new();
    let panels = &dashboard.panels;
    let fleet = &panels.fleet;
    out.push("Fleet Status:".to_string());
    out.push(format!("  AI:          {}", fleet.ai_status));
    out.push(format!("  Satellites:  {}", fleet.active_satellites));
    out.push(format!("  NEOs:        {}", fleet.tracking_neos));

    if !panels.studio_log.is_empty() {
        out.push("Studio Log:".to_string());
        for entry in &panels.studio_log {
            out.push(format!("  {}: {}", entry.speaker, entry.message));
        }
    }

    let session = &dashboard.session;
    out.push("Scene:".to_string());
    out.push(format!("  Tracked objects: {}", session.registry().len()));
    out.push(format!("  Bulk objects:    {}", session.bulk().len()));
    out.push(format!("  Instances:       {}", session.instances().len()));
    if let Some(path) = session.plotted_path() {
        out.push(format!("  Plotted path:    {} ({} points)", path.id, path.points.len()));
    }

    if let Some(status) = &panels.plot_status {
        out.push(format!("Status: {}", status.text));
    }

    if let Some(readout) = &panels.engineering {
        out.push("Engineering:".to_string());
        out.extend(readout.lines().into_iter().map(|line| format!("  {}", line)));
    }
    out
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Watch { duration, frame_ms } => {
            let config = load_config(&cli)?;
            let client = NativeHttpClient::new(&config.base_url)
                .context("Failed to build HTTP client")?;
            let mut dashboard = Dashboard::new(&config, 0.0);
            dashboard.bootstrap(&client).await;

            let options = PollerOptions {
                run_for: Some(Duration::from_secs_f64(duration.max(0.0))),
                frame_interval: (*frame_ms > 0).then(|| Duration::from_millis(*frame_ms)),
            };
            println!("Watching {} for {:.1}s", config.base_url, duration);
            let stats = run_poller(&client, &mut dashboard, PollSchedule::from_config(&config), options).await;

            println!();
            for line in dashboard_report(&dashboard) {
                println!("{}", line);
            }

            println!("\nPolls:");
            for target in PollSchedule::from_config(&config).targets() {
                println!("  {:<28} {}", target.path(), stats.count(target));
            }
            println!("  failed: {}, frames: {}", stats.failed, stats.frames);
        }

        Commands::Propagate {
            semi_major_axis,
            eccentricity,
            inclination,
            mean_anomaly,
            period,
            time,
        } => {
            let elements = AsteroidOrbitalElement {
                semi_major_axis: *semi_major_axis,
                eccentricity: *eccentricity,
                inclination: inclination.to_radians(),
                mean_anomaly: mean_anomaly.to_radians(),
                period: period.unwrap_or_else(|| semi_major_axis.powi(3).sqrt()),
                size: 0.0,
            };

            let m = elements.mean_anomaly_at(*time);
            let au = elements.position_au(*time);
            let scene = elements.scene_position(*time);
            println!("Orbital time {}:", time);
            println!("  M:      {:.6} rad ({:.2}°)", m, m.to_degrees());
            println!("  r:      {:.6} AU", elements.radius(m));
            println!("  AU:     ({:.6}, {:.6}, {:.6})", au.x, au.y, au.z);
            println!("  Scene:  ({:.3}, {:.3}, {:.3})  [{} units/AU]", scene.x, scene.y, scene.z, SCENE_SCALE_AU);
        }

        Commands::Belt { count, seed, output } => {
            let belt = generate_belt(*count, *seed, &BeltConfig::default());
            let json = serde_json::to_string_pretty(&belt)?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Generated {} asteroids -> {:?}", count, path);
                }
                None => println!("{}", json),
            }
        }

        Commands::Plot { id } => {
            let config = load_config(&cli)?;
            let client = NativeHttpClient::new(&config.base_url)?;
            let mut dashboard = Dashboard::new(&config, 0.0);
            dashboard.request_plot(&client, id).await;
            if let Some(status) = &dashboard.panels.plot_status {
                println!("{}", status.text);
            }
        }

        Commands::Chat { message } => {
            let config = load_config(&cli)?;
            let client = NativeHttpClient::new(&config.base_url)?;
            let mut chat = ChatSession::new();
            let Some(request) = chat.send(message) else {
                anyhow::bail!("Message is empty");
            };

            let mut stdout = std::io::stdout();
            let result = client
                .stream_chat(&request.message, |event| {
                    if let fleet_engine::event_stream::ChatEvent::Chunk(chunk) = &event {
                        let _ = write!(stdout, "{}", chunk);
                        let _ = stdout.flush();
                    }
                    chat.on_event(request.generation, event);
                })
                .await;

            if let Err(err) = result {
                chat.on_event(
                    request.generation,
                    fleet_engine::event_stream::ChatEvent::Error(err.to_string()),
                );
                println!();
                return Err(err).context("Chat stream failed");
            }
            println!();
        }

        Commands::Command { command, args } => {
            let config = load_config(&cli)?;
            let client = NativeHttpClient::new(&config.base_url)?;
            let dashboard = Dashboard::new(&config, 0.0);
            let result = dashboard
                .send_command(&client, command, args.clone())
                .await
                .with_context(|| format!("Command '{}' failed", command))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
