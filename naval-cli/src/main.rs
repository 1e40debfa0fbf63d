//! Naval Dashboard CLI
//!
//! Simulated naval surveillance dashboard with model drift monitoring.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use naval_core::{display, local_clock, DashboardConfig, DashboardState, Rect};
use naval_detect::{create_detector, DetectConfig, DetectionBackend, HttpDetector, ImageUpload};
use naval_runtime::{Monitor, MonitorConfig, MonitorEvent, UploadStatus};

#[derive(Parser)]
#[command(name = "naval-dashboard")]
#[command(author, version, about = "Naval command dashboard with simulated model drift", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Detection service base URL
    #[arg(long, env = "NAVAL_DETECT_URL", default_value = "http://127.0.0.1:8080")]
    detect_url: String,

    /// Scenario file (TOML) replacing the built-in scenario
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the dashboard and print it after every simulator tick
    Watch {
        /// Simulator period in milliseconds (default from scenario)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// How long to stay mounted, in seconds (0 = until Ctrl-C)
        #[arg(long, default_value = "60")]
        duration: u64,

        /// Image to send through detection once mounted
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Retrain as soon as the drift alert is raised
        #[arg(long)]
        auto_retrain: bool,

        /// Open the model metrics panel
        #[arg(long)]
        metrics: bool,

        /// Print JSON snapshots instead of text frames
        #[arg(long)]
        json: bool,

        /// Seed for the simulator
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run detection and drift checks on a single image
    Detect {
        /// Image to upload
        #[arg(short, long)]
        image: PathBuf,

        /// Where to write the annotated image (default: detected_<timestamp>.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Detection confidence threshold (0.0 - 1.0)
        #[arg(long)]
        conf: Option<f64>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Select a rectangle on the satellite view and show its sector intel
    Area {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        /// Signed width in pixels
        #[arg(long, allow_hyphen_values = true)]
        width: f64,
        /// Signed height in pixels
        #[arg(long, allow_hyphen_values = true)]
        height: f64,
        /// Analysis notes to attach
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check the detection service
    Status,

    /// Print the initial dashboard state
    Snapshot {
        /// Render as text instead of JSON
        #[arg(long)]
        text: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let dashboard = load_dashboard(cli.config.as_deref())?;
    let detect_config = DetectConfig::default().with_base_url(&cli.detect_url);

    match cli.command {
        Commands::Watch {
            interval_ms,
            duration,
            image,
            auto_retrain,
            metrics,
            json,
            seed,
        } => {
            let options = WatchOptions {
                interval_ms,
                duration,
                image,
                auto_retrain,
                metrics,
                json,
                seed,
            };
            run_watch(dashboard, detect_config, options).await?;
        }
        Commands::Detect {
            image,
            output,
            conf,
            timeout,
        } => {
            let mut config = detect_config;
            if let Some(conf) = conf {
                config = config.with_confidence(conf);
            }
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            run_detect(config, &image, output).await?;
        }
        Commands::Area {
            x,
            y,
            width,
            height,
            notes,
            seed,
        } => {
            run_area(&dashboard, Rect { start_x: x, start_y: y, width, height }, notes, seed);
        }
        Commands::Status => {
            check_status(&detect_config).await?;
        }
        Commands::Snapshot { text } => {
            let state = DashboardState::new(&dashboard);
            if text {
                println!("{}", display::render(&state, local_clock()));
            } else {
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
        }
    }

    Ok(())
}

fn load_dashboard(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("loading scenario {}", path.display())),
        None => DashboardConfig::load_embedded().context("loading built-in scenario"),
    }
}

struct WatchOptions {
    interval_ms: Option<u64>,
    duration: u64,
    image: Option<PathBuf>,
    auto_retrain: bool,
    metrics: bool,
    json: bool,
    seed: Option<u64>,
}

async fn run_watch(
    dashboard: DashboardConfig,
    detect_config: DetectConfig,
    options: WatchOptions,
) -> Result<()> {
    println!("🛰️  Naval Command System - {}\n", dashboard.scenario.sector);

    let mut config = MonitorConfig::from_dashboard(dashboard);
    if let Some(interval_ms) = options.interval_ms {
        config.tick_interval_ms = interval_ms;
    }
    config.max_runtime_secs = options.duration;
    config.seed = options.seed;
    config = config.with_detector(create_detector(detect_config)?);

    let mounted = Monitor::mount(config);
    let handle = mounted.handle();
    let mut events = mounted.subscribe();

    if options.metrics {
        handle.toggle_metrics_panel().await?;
    }

    if let Some(path) = &options.image {
        match ImageUpload::from_path(path).await {
            Ok(image) => {
                println!("📤 Uploading {}...", image.file_name);
                match handle.upload(image).await? {
                    UploadStatus::Completed {
                        drift_detected,
                        detections,
                    } => {
                        println!("✅ Detection complete: {} objects", detections);
                        if drift_detected {
                            println!("⚠️  Service reported model drift");
                        }
                    }
                    UploadStatus::Failed(e) => println!("❌ Upload failed: {}", e),
                    UploadStatus::Unavailable => println!("⚠️  No detection service configured"),
                }
            }
            Err(e) => warn!("Skipping upload: {}", e),
        }
    }

    let initial = handle.snapshot().await?;
    print_frame(&initial, options.json)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(MonitorEvent::Ticked { snapshot, .. }) => {
                        print_frame(&snapshot, options.json)?;
                    }
                    Ok(MonitorEvent::AlertRaised { drift_score }) => {
                        println!("\n⚠️  Model drift detected (score {:.1})", drift_score);
                        if options.auto_retrain {
                            println!("🔁 Retraining model...");
                            handle.retrain().await?;
                        }
                    }
                    Ok(MonitorEvent::Retrained) => info!("Model retrained"),
                    Ok(MonitorEvent::UploadFinished(_)) => {}
                    Ok(MonitorEvent::Unmounted) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => warn!("Skipped {} dashboard events", skipped),
                }
            }
            _ = &mut ctrl_c => {
                println!("\n🛑 Unmounting dashboard...");
                break;
            }
        }
    }

    let state = mounted.unmount().await?;
    println!("\n📊 Final model state:");
    println!("   Drift score: {:.1}", state.metrics.drift_score);
    println!("   Accuracy: {:.1}%", state.metrics.accuracy);
    println!("   Last updated: {}", state.metrics.last_updated);

    Ok(())
}

fn print_frame(state: &DashboardState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        println!("\n{}", "=".repeat(60));
        println!("{}", display::render(state, local_clock()));
    }
    Ok(())
}

async fn run_detect(config: DetectConfig, path: &Path, output: Option<PathBuf>) -> Result<()> {
    println!("📡 Detection service: {}", config.base_url);

    let image = ImageUpload::from_path(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let detector = HttpDetector::new(config)?;

    println!("🔍 Detecting ships in {}...", image.file_name);
    let result = detector.detect(&image).await?;

    if result.detections.is_empty() {
        println!("   No objects detected");
    }
    for (class, count) in &result.detections {
        println!("   {}: {}", class, count);
    }

    if let Some(bytes) = result.decode_image()? {
        let output_path = output.unwrap_or_else(|| {
            let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
            PathBuf::from(format!("detected_{}.jpg", timestamp))
        });
        fs::write(&output_path, bytes)?;
        println!("📄 Annotated image saved to: {}", output_path.display());
    }

    println!("\n📈 Checking for model drift...");
    let drift = detector.detect_drift(&image).await?;
    if drift.detected() {
        println!("{}", display::drift_popup(&drift));
    } else {
        println!("✅ No drift detected");
    }

    Ok(())
}

fn run_area(dashboard: &DashboardConfig, rect: Rect, notes: Option<String>, seed: Option<u64>) {
    let mut state = DashboardState::new(dashboard);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if state.select_area(rect, &mut rng, local_clock()).is_none() {
        println!("Selection too small: both sides must exceed 20px");
        return;
    }
    if let Some(notes) = notes {
        state.set_area_notes(&notes);
    }

    if let Some(selection) = state.area.selection() {
        println!(
            "📍 Popup at ({:.0}, {:.0})\n",
            selection.popup_x, selection.popup_y
        );
        println!("{}", display::area_popup(&selection.data));
    }
}

async fn check_status(config: &DetectConfig) -> Result<()> {
    println!("🔌 Checking detection service...\n");

    match naval_detect::check_service(config).await {
        Ok(true) => {
            println!("✅ Detection service is running");
            println!("   Endpoint: {}", config.base_url);
        }
        Ok(false) => {
            println!("❌ Detection service is not accessible");
            println!("   Expected at: {}", config.base_url);
            println!("\n   Start the service or pass --detect-url");
        }
        Err(e) => {
            println!("❌ Error checking detection service: {}", e);
        }
    }

    Ok(())
}
