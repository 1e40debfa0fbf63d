//! Dashboard Monitor
//!
//! Runs one mounted dashboard session:
//! - A single task owns the dashboard state, no locks
//! - A periodic timer ticks the simulator while mounted
//! - User commands arrive over a channel and run between ticks
//! - Uploads are awaited in place, so at most one is in flight
//! - Unmounting drops the timer

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use naval_core::{
    local_clock, DashboardConfig, DashboardState, DetectionOutcome, DriftSimulator, Rect,
    TickOutcome,
};
use naval_detect::{DetectionBackend, ImageUpload, SharedDetector};

/// Monitor configuration
pub struct MonitorConfig {
    /// Scenario the dashboard starts from
    pub dashboard: DashboardConfig,
    /// Detection service, if uploads are enabled
    pub detector: Option<SharedDetector>,
    /// Simulator period in milliseconds
    pub tick_interval_ms: u64,
    /// Maximum runtime in seconds (0 = unlimited)
    pub max_runtime_secs: u64,
    /// Seed for the simulator's random source
    pub seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let dashboard = DashboardConfig::default();
        Self {
            tick_interval_ms: dashboard.simulator.tick_interval_ms,
            dashboard,
            detector: None,
            max_runtime_secs: 0,
            seed: None,
        }
    }
}

impl MonitorConfig {
    pub fn from_dashboard(dashboard: DashboardConfig) -> Self {
        Self {
            tick_interval_ms: dashboard.simulator.tick_interval_ms,
            dashboard,
            ..Default::default()
        }
    }

    pub fn with_detector(mut self, detector: SharedDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Errors from talking to a mounted session
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Dashboard is not mounted")]
    Unmounted,

    #[error("Monitor task failed: {0}")]
    Join(String),
}

/// How an upload ended
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Completed {
        drift_detected: bool,
        detections: u64,
    },
    /// Logged and swallowed; only the loading flag changed
    Failed(String),
    /// No detection service configured
    Unavailable,
}

/// Commands accepted by a mounted session
#[derive(Debug)]
pub enum Command {
    Retrain,
    ToggleAlert,
    DismissAlert,
    ToggleMetricsPanel,
    CloseDriftPopup,
    SelectArea(Rect),
    SetAreaNotes(String),
    CloseArea,
    Upload {
        image: ImageUpload,
        reply: oneshot::Sender<UploadStatus>,
    },
    Snapshot(oneshot::Sender<DashboardState>),
    Unmount,
}

/// Notifications published by the session
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Ticked {
        outcome: TickOutcome,
        snapshot: Box<DashboardState>,
    },
    AlertRaised {
        drift_score: f64,
    },
    Retrained,
    UploadFinished(UploadStatus),
    Unmounted,
}

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// The dashboard session
pub struct Monitor {
    state: DashboardState,
    simulator: DriftSimulator,
    rng: StdRng,
    detector: Option<SharedDetector>,
    tick_interval_ms: u64,
    max_runtime_secs: u64,
    events: broadcast::Sender<MonitorEvent>,
}

impl Monitor {
    /// Create an unmounted session
    pub fn new(config: MonitorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            state: DashboardState::new(&config.dashboard),
            simulator: DriftSimulator::new(config.dashboard.simulator.steps()),
            rng,
            detector: config.detector,
            tick_interval_ms: config.tick_interval_ms.max(1),
            max_runtime_secs: config.max_runtime_secs,
            events,
        }
    }

    /// Spawn the session task and start its timer
    pub fn mount(config: MonitorConfig) -> MountedMonitor {
        let monitor = Self::new(config);
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let handle = MonitorHandle {
            commands,
            events: monitor.events.clone(),
        };
        let task = tokio::spawn(monitor.run(receiver));

        MountedMonitor { handle, task }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Run until unmounted, every handle is dropped, or the runtime limit hits
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> DashboardState {
        let period = Duration::from_millis(self.tick_interval_ms);
        // First tick after a full period, like a browser interval
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Zero disables the limit
        let limited = self.max_runtime_secs > 0;
        let deadline = sleep_until(Instant::now() + Duration::from_secs(self.max_runtime_secs));
        tokio::pin!(deadline);

        info!("Dashboard mounted, ticking every {}ms", self.tick_interval_ms);

        loop {
            tokio::select! {
                _ = &mut deadline, if limited => {
                    warn!("Dashboard reached maximum runtime");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
                command = commands.recv() => {
                    match command {
                        Some(Command::Unmount) => break,
                        Some(command) => self.handle(command).await,
                        None => {
                            debug!("All handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        info!("Dashboard unmounted, timer cancelled");
        let _ = self.events.send(MonitorEvent::Unmounted);
        self.state
    }

    /// One simulator period
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.state.tick(&self.simulator, &mut self.rng, local_clock());

        if outcome.alert_raised {
            let _ = self.events.send(MonitorEvent::AlertRaised {
                drift_score: outcome.drift_score,
            });
        }
        let _ = self.events.send(MonitorEvent::Ticked {
            outcome,
            snapshot: Box::new(self.state.clone()),
        });

        outcome
    }

    pub fn retrain(&mut self) {
        self.state.retrain(local_clock());
        let _ = self.events.send(MonitorEvent::Retrained);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Retrain => self.retrain(),
            Command::ToggleAlert => {
                let active = self.state.toggle_alert();
                debug!("Drift alert toggled: {}", active);
            }
            Command::DismissAlert => self.state.dismiss_alert(),
            Command::ToggleMetricsPanel => {
                self.state.toggle_metrics_panel();
            }
            Command::CloseDriftPopup => self.state.close_drift_popup(),
            Command::SelectArea(rect) => {
                let now = local_clock();
                match self.state.select_area(rect, &mut self.rng, now) {
                    Some(selection) => info!("Selected area {}", selection.data.area_id),
                    None => debug!("Selection too small, ignored"),
                }
            }
            Command::SetAreaNotes(notes) => {
                if !self.state.set_area_notes(&notes) {
                    debug!("No area selected, notes dropped");
                }
            }
            Command::CloseArea => self.state.close_area(),
            Command::Upload { image, reply } => {
                let status = self.upload(image).await;
                let _ = reply.send(status);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.state.clone());
            }
            Command::Unmount => {}
        }
    }

    /// Send an image through detection and drift checks.
    ///
    /// Failures are logged and leave everything but the loading flag as it was.
    pub async fn upload(&mut self, image: ImageUpload) -> UploadStatus {
        let Some(detector) = self.detector.clone() else {
            warn!("Upload of {} ignored: no detection service configured", image.file_name);
            return UploadStatus::Unavailable;
        };

        let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        info!(
            "[{}] Uploading {} to {}",
            request_id,
            image.file_name,
            detector.endpoint()
        );
        self.state.begin_upload();

        let status = match run_detection(detector.as_ref(), &image).await {
            Ok((outcome, detections)) => {
                let drift_detected = outcome.drift.detected();
                if drift_detected {
                    warn!("[{}] Service reported model drift", request_id);
                }
                self.state.complete_upload(outcome);
                info!("[{}] Detection complete: {} objects", request_id, detections);
                UploadStatus::Completed {
                    drift_detected,
                    detections,
                }
            }
            Err(e) => {
                error!("[{}] Error calling detection service: {}", request_id, e);
                self.state.fail_upload();
                UploadStatus::Failed(e.to_string())
            }
        };

        let _ = self.events.send(MonitorEvent::UploadFinished(status.clone()));
        status
    }
}

async fn run_detection(
    detector: &dyn DetectionBackend,
    image: &ImageUpload,
) -> Result<(DetectionOutcome, u64), naval_detect::DetectError> {
    let detection = detector.detect(image).await?;
    debug!("Detections: {:?}", detection.detections);

    let drift = detector.detect_drift(image).await?;
    debug!("Drift report: {:?}", drift);

    let outcome = DetectionOutcome {
        image_name: image.file_name.clone(),
        annotated_image: detection.annotated_data_url(),
        drift,
    };
    Ok((outcome, detection.total_detections()))
}

/// Cloneable handle for sending commands to a mounted session
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<MonitorEvent>,
}

impl MonitorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub async fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RuntimeError::Unmounted)
    }

    pub async fn retrain(&self) -> Result<(), RuntimeError> {
        self.send(Command::Retrain).await
    }

    pub async fn toggle_alert(&self) -> Result<(), RuntimeError> {
        self.send(Command::ToggleAlert).await
    }

    pub async fn dismiss_alert(&self) -> Result<(), RuntimeError> {
        self.send(Command::DismissAlert).await
    }

    pub async fn toggle_metrics_panel(&self) -> Result<(), RuntimeError> {
        self.send(Command::ToggleMetricsPanel).await
    }

    pub async fn close_drift_popup(&self) -> Result<(), RuntimeError> {
        self.send(Command::CloseDriftPopup).await
    }

    pub async fn select_area(&self, rect: Rect) -> Result<(), RuntimeError> {
        self.send(Command::SelectArea(rect)).await
    }

    pub async fn set_area_notes(&self, notes: &str) -> Result<(), RuntimeError> {
        self.send(Command::SetAreaNotes(notes.to_string())).await
    }

    pub async fn close_area(&self) -> Result<(), RuntimeError> {
        self.send(Command::CloseArea).await
    }

    pub async fn upload(&self, image: ImageUpload) -> Result<UploadStatus, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Upload { image, reply }).await?;
        response.await.map_err(|_| RuntimeError::Unmounted)
    }

    pub async fn snapshot(&self) -> Result<DashboardState, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        response.await.map_err(|_| RuntimeError::Unmounted)
    }
}

/// A running session and its task
pub struct MountedMonitor {
    handle: MonitorHandle,
    task: JoinHandle<DashboardState>,
}

impl MountedMonitor {
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.handle.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the timer and return the final state
    pub async fn unmount(self) -> Result<DashboardState, RuntimeError> {
        // Already stopped on its own if the send fails
        let _ = self.handle.send(Command::Unmount).await;
        self.join().await
    }

    /// Wait for the session to stop by itself
    pub async fn join(self) -> Result<DashboardState, RuntimeError> {
        self.task.await.map_err(|e| RuntimeError::Join(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use naval_core::DriftReport;
    use naval_detect::{DetectError, DetectionResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct StubDetector {
        drift: bool,
    }

    #[async_trait]
    impl DetectionBackend for StubDetector {
        async fn detect(&self, _image: &ImageUpload) -> Result<DetectionResult, DetectError> {
            let mut detections = BTreeMap::new();
            detections.insert("ship".to_string(), 3);
            Ok(DetectionResult {
                image: Some("QUJD".to_string()),
                detections,
                result_count: 1,
            })
        }

        async fn detect_drift(&self, _image: &ImageUpload) -> Result<DriftReport, DetectError> {
            Ok(DriftReport {
                is_drift: Some(self.drift),
                distance: Some(0.02),
                distance_threshold: Some(0.01),
                p_value: Some(0.001),
                threshold: Some(0.05),
            })
        }

        fn endpoint(&self) -> &str {
            "stub"
        }
    }

    struct FailingDetector;

    #[async_trait]
    impl DetectionBackend for FailingDetector {
        async fn detect(&self, _image: &ImageUpload) -> Result<DetectionResult, DetectError> {
            Err(DetectError::Status {
                endpoint: "/detect".to_string(),
                status: 500,
            })
        }

        async fn detect_drift(&self, _image: &ImageUpload) -> Result<DriftReport, DetectError> {
            Ok(DriftReport::default())
        }

        fn endpoint(&self) -> &str {
            "failing"
        }
    }

    fn harbor() -> ImageUpload {
        ImageUpload::new("harbor.jpg", vec![0xff, 0xd8, 0xff, 0xd9]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_while_mounted() {
        let mounted = Monitor::mount(MonitorConfig::default().with_seed(1));
        let mut events = mounted.subscribe();

        let outcome = loop {
            if let MonitorEvent::Ticked { outcome, .. } = events.recv().await.unwrap() {
                break outcome;
            }
        };
        assert_eq!(outcome.previous_drift, 18.0);
        assert!(outcome.drift_score >= 18.0);

        let state = mounted.unmount().await.unwrap();
        assert!(state.metrics.drift_score >= 18.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_first_period() {
        let mounted = Monitor::mount(MonitorConfig::default().with_seed(1));
        let handle = mounted.handle();

        tokio::time::sleep(Duration::from_millis(4900)).await;
        let state = handle.snapshot().await.unwrap();
        assert_eq!(state.metrics.drift_score, 18.0);
        assert_eq!(state.metrics.last_updated, "22:38:45");

        mounted.unmount().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_apply_in_order() {
        let mounted = Monitor::mount(MonitorConfig::default().with_seed(2));
        let handle = mounted.handle();

        handle.toggle_alert().await.unwrap();
        handle.toggle_metrics_panel().await.unwrap();
        let state = handle.snapshot().await.unwrap();
        assert!(state.alert_active());
        assert!(state.show_metrics_panel);

        handle.retrain().await.unwrap();
        let state = handle.snapshot().await.unwrap();
        assert!(!state.alert_active());
        assert_eq!(state.metrics.drift_score, 5.0);
        assert_eq!(state.metrics.accuracy, 98.0);

        mounted.unmount().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_area_selection_commands() {
        let mounted = Monitor::mount(MonitorConfig::default().with_seed(3));
        let handle = mounted.handle();

        handle
            .select_area(Rect {
                start_x: 10.0,
                start_y: 10.0,
                width: 5.0,
                height: 80.0,
            })
            .await
            .unwrap();
        assert!(handle.snapshot().await.unwrap().area.selection().is_none());

        handle
            .select_area(Rect {
                start_x: 10.0,
                start_y: 10.0,
                width: 60.0,
                height: 80.0,
            })
            .await
            .unwrap();
        handle.set_area_notes("small craft near breakwater").await.unwrap();
        let state = handle.snapshot().await.unwrap();
        let selection = state.area.selection().unwrap();
        assert_eq!(selection.data.notes, "small craft near breakwater");
        assert_eq!((selection.popup_x, selection.popup_y), (70.0, 90.0));

        handle.close_area().await.unwrap();
        assert!(handle.snapshot().await.unwrap().area.selection().is_none());

        mounted.unmount().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_session() {
        let mounted = Monitor::mount(MonitorConfig::default());
        let handle = mounted.handle();

        mounted.unmount().await.unwrap();

        assert!(matches!(handle.retrain().await, Err(RuntimeError::Unmounted)));
        assert!(matches!(handle.snapshot().await, Err(RuntimeError::Unmounted)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_runtime_stops_session() {
        let config = MonitorConfig {
            max_runtime_secs: 12,
            ..MonitorConfig::default().with_seed(4)
        };
        let mounted = Monitor::mount(config);

        let state = mounted.join().await.unwrap();
        assert!(state.metrics.drift_score > 18.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_runtime_shorter_than_period() {
        let config = MonitorConfig {
            tick_interval_ms: 600_000,
            max_runtime_secs: 5,
            ..MonitorConfig::default().with_seed(4)
        };
        let started = Instant::now();
        let mounted = Monitor::mount(config);

        let state = mounted.join().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(6));
        assert_eq!(state.metrics.drift_score, 18.0);
    }

    #[tokio::test]
    async fn test_upload_with_drift() {
        let config = MonitorConfig::default().with_detector(Arc::new(StubDetector { drift: true }));
        let mut monitor = Monitor::new(config);

        let status = monitor.upload(harbor()).await;

        assert_eq!(
            status,
            UploadStatus::Completed {
                drift_detected: true,
                detections: 3
            }
        );
        let state = monitor.state();
        assert!(!state.is_loading);
        assert!(state.alert_active());
        assert!(state.show_drift_popup);
        assert_eq!(state.background_image, "data:image/jpeg;base64,QUJD");
        assert_eq!(state.drift_report.as_ref().unwrap().p_value, Some(0.001));
    }

    #[tokio::test]
    async fn test_upload_without_drift_leaves_alert_off() {
        let config = MonitorConfig::default().with_detector(Arc::new(StubDetector { drift: false }));
        let mut monitor = Monitor::new(config);

        monitor.upload(harbor()).await;

        assert!(!monitor.state().alert_active());
        assert!(monitor.state().drift_report.is_none());
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_state_unchanged() {
        let config = MonitorConfig::default().with_detector(Arc::new(FailingDetector));
        let mut monitor = Monitor::new(config);
        let before = monitor.state().clone();

        let status = monitor.upload(harbor()).await;

        assert!(matches!(status, UploadStatus::Failed(_)));
        let state = monitor.state();
        assert!(!state.is_loading);
        assert_eq!(state.metrics, before.metrics);
        assert_eq!(state.background_image, before.background_image);
        assert_eq!(state.ships, before.ships);
        assert!(!state.alert_active());
    }

    #[tokio::test]
    async fn test_upload_without_detector() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        assert_eq!(monitor.upload(harbor()).await, UploadStatus::Unavailable);
        assert!(!monitor.state().is_loading);
    }

    #[tokio::test]
    async fn test_upload_through_handle() {
        let config = MonitorConfig {
            tick_interval_ms: 60_000,
            ..MonitorConfig::default().with_detector(Arc::new(StubDetector { drift: true }))
        };
        let mounted = Monitor::mount(config);
        let handle = mounted.handle();

        let status = handle.upload(harbor()).await.unwrap();
        assert!(matches!(status, UploadStatus::Completed { drift_detected: true, .. }));

        let state = mounted.unmount().await.unwrap();
        assert!(state.alert_active());
        assert_eq!(state.upload_count, 1);
    }

    #[test]
    fn test_seeded_monitors_agree() {
        let mut a = Monitor::new(MonitorConfig::default().with_seed(9));
        let mut b = Monitor::new(MonitorConfig::default().with_seed(9));
        for _ in 0..5 {
            let left = a.tick();
            let right = b.tick();
            assert_eq!(left.drift_score, right.drift_score);
            assert_eq!(left.accuracy, right.accuracy);
        }
    }
}
