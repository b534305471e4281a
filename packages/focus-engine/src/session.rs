use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use focus_algo::{AlertAggregator, IdleMonitor, PresenceTracker, ScoringEngine, TrackingState};
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::snapshot::{FocusSnapshot, SnapshotCell, TrackingStatus};
use crate::source::{LandmarkSource, SourceError};

/// Consecutive detection failures between repeated warnings.
const ERROR_LOG_EVERY: u64 = 100;

/// Shortest alert tick; `tokio::time::interval` rejects a zero period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("focus session already running")]
    AlreadyRunning,
    #[error("focus session not running")]
    NotRunning,
    #[error("failed to initialize landmark source: {0}")]
    SourceInit(#[source] SourceError),
}

/// Session-relative monotonic clock plus the latest pointer activity.
#[derive(Debug)]
struct ActivityClock {
    origin: Instant,
    last_activity_ms: AtomicU64,
}

impl ActivityClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn touch(&self) {
        self.last_activity_ms.fetch_max(self.now_ms(), Ordering::Relaxed);
    }

    fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms.load(Ordering::Relaxed)
    }
}

struct RunningLoops {
    shutdown_tx: broadcast::Sender<()>,
    detection: JoinHandle<()>,
    tick: JoinHandle<()>,
}

/// One tracked learner: a detection loop scoring frames and a tick loop
/// raising alerts, both writing into a shared [`SnapshotCell`].
pub struct FocusSession {
    config: SessionConfig,
    cell: Arc<SnapshotCell>,
    clock: Arc<ActivityClock>,
    snapshot_tx: Arc<watch::Sender<FocusSnapshot>>,
    running: Mutex<Option<RunningLoops>>,
}

impl FocusSession {
    pub fn new(mut config: SessionConfig) -> Self {
        config.tick_interval = config.tick_interval.max(MIN_TICK_INTERVAL);
        let (snapshot_tx, _) = watch::channel(FocusSnapshot::default());
        Self {
            config,
            cell: Arc::new(SnapshotCell::new()),
            clock: Arc::new(ActivityClock::new()),
            snapshot_tx: Arc::new(snapshot_tx),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Opens `source` and spawns both loops.
    ///
    /// If the source fails to open it is closed again and no loop runs.
    pub async fn start<S>(&self, mut source: S) -> Result<(), SessionError>
    where
        S: LandmarkSource + 'static,
    {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SessionError::AlreadyRunning);
        }

        if let Err(e) = source.open().await {
            source.close().await;
            warn!(error = %e, "landmark source failed to open");
            return Err(SessionError::SourceInit(e));
        }

        self.cell.reset();
        self.clock.touch();
        self.snapshot_tx.send_replace(self.cell.load());

        let (shutdown_tx, _) = broadcast::channel(1);

        let engine = ScoringEngine::new(self.config.features.clone(), self.config.scoring.clone());
        let detection = tokio::spawn(run_detection_loop(
            source,
            engine,
            Arc::clone(&self.cell),
            Arc::clone(&self.clock),
            shutdown_tx.subscribe(),
        ));

        let tick = tokio::spawn(run_tick_loop(
            self.config.clone(),
            Arc::clone(&self.cell),
            Arc::clone(&self.clock),
            Arc::clone(&self.snapshot_tx),
            shutdown_tx.subscribe(),
        ));

        *running = Some(RunningLoops {
            shutdown_tx,
            detection,
            tick,
        });

        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            idle_threshold_secs = self.config.idle_threshold_secs,
            alpha = self.config.scoring.effective_alpha(),
            lost_policy = self.config.scoring.lost_policy.as_str(),
            "focus session started"
        );
        Ok(())
    }

    /// Cancels both loops and waits for them, so no field changes after this
    /// returns. The source is closed by the detection loop on its way out.
    ///
    /// The running slot stays locked until both loops have exited, so a
    /// concurrent `start` waits for the previous source to be released.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let mut running = self.running.lock().await;
        let loops = running.take().ok_or(SessionError::NotRunning)?;

        let _ = loops.shutdown_tx.send(());
        for (name, handle) in [("detection", loops.detection), ("tick", loops.tick)] {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "session loop ended abnormally");
            }
        }
        drop(running);

        info!("focus session stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Pointer activity happened now.
    pub fn on_activity(&self) {
        self.clock.touch();
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        self.cell.load()
    }

    /// Receives a fresh snapshot once per tick.
    pub fn subscribe(&self) -> watch::Receiver<FocusSnapshot> {
        self.snapshot_tx.subscribe()
    }
}

/// Rate-limits per-frame failure logs: the first failure of a streak and
/// every `ERROR_LOG_EVERY`th after it are warnings.
#[derive(Debug, Default)]
struct FrameErrorLog {
    streak: u64,
}

impl FrameErrorLog {
    fn failed(&mut self, error: &SourceError) {
        self.streak += 1;
        if self.streak == 1 || self.streak % ERROR_LOG_EVERY == 0 {
            warn!(consecutive = self.streak, error = %error, "frame detection failed");
        } else {
            debug!(consecutive = self.streak, error = %error, "frame detection failed");
        }
    }

    fn succeeded(&mut self) {
        if self.streak > 0 {
            info!(failed_frames = self.streak, "frame detection recovered");
            self.streak = 0;
        }
    }
}

async fn run_detection_loop<S>(
    mut source: S,
    mut engine: ScoringEngine,
    cell: Arc<SnapshotCell>,
    clock: Arc<ActivityClock>,
    mut shutdown: broadcast::Receiver<()>,
) where
    S: LandmarkSource,
{
    let mut presence = PresenceTracker::new();
    let mut errors = FrameErrorLog::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            next = source.next_frame() => next,
        };

        let (outcome, status) = match next {
            Ok(frame) => {
                errors.succeeded();
                let outcome = engine.process(frame);
                let status = if outcome.state.is_tracking() {
                    TrackingStatus::Tracking
                } else {
                    TrackingStatus::NoFace
                };
                (outcome, status)
            }
            Err(SourceError::Closed) => {
                info!("landmark source closed, detection loop finished");
                break;
            }
            Err(e) => {
                errors.failed(&e);
                cell.record_detection_error();
                (engine.mark_lost(), TrackingStatus::DetectionError)
            }
        };

        if presence.observe(outcome.state) {
            let smoothed = outcome.score.smoothed;
            match outcome.state {
                TrackingState::Tracking => info!(smoothed, "face acquired"),
                TrackingState::Lost => info!(smoothed, "face lost"),
            }
        }

        cell.record_frame(presence.is_present(), outcome.score, status, clock.now_ms());
    }

    source.close().await;
    debug!(transitions = presence.transitions(), "detection loop exited");
}

async fn run_tick_loop(
    config: SessionConfig,
    cell: Arc<SnapshotCell>,
    clock: Arc<ActivityClock>,
    snapshot_tx: Arc<watch::Sender<FocusSnapshot>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut idle = IdleMonitor::new(clock.last_activity_ms());
    let mut alerts = AlertAggregator::new(config.idle_threshold_secs);

    let period = config.tick_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        let now_ms = clock.now_ms();
        idle.record_activity(clock.last_activity_ms());
        let idle_seconds = idle.tick(now_ms);

        let presence = effective_presence(&cell, &config, now_ms);
        let update = alerts.evaluate(presence, idle_seconds);
        if update.changed {
            if update.state.active {
                info!(
                    reason = %update.state.reason,
                    idle_seconds,
                    idle_threshold_secs = alerts.idle_threshold_secs(),
                    "focus alert raised"
                );
            } else {
                info!(previous = %update.previous.reason, "focus alert cleared");
            }
        }

        cell.record_tick(idle_seconds, update.state);
        snapshot_tx.send_replace(cell.load());
    }

    debug!("tick loop exited");
}

/// Presence as the alert rule sees it. With staleness enabled, a face that
/// has not been reported for too long counts as gone.
fn effective_presence(cell: &SnapshotCell, config: &SessionConfig, now_ms: u64) -> bool {
    if !cell.presence() {
        return false;
    }
    match (config.presence_stale_after, cell.last_frame_ms()) {
        (Some(limit), Some(last)) => now_ms.saturating_sub(last) <= limit.as_millis() as u64,
        _ => true,
    }
}
