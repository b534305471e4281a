use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use focus_algo::{AlertReason, AlertState, FocusScore};
use serde::Serialize;

const NO_FRAME: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    #[default]
    Initializing,
    Tracking,
    NoFace,
    DetectionError,
}

impl TrackingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TrackingStatus::Initializing => "Loading...",
            TrackingStatus::Tracking => "Tracking",
            TrackingStatus::NoFace => "No face detected",
            TrackingStatus::DetectionError => "Prediction error",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            TrackingStatus::Initializing => 0,
            TrackingStatus::Tracking => 1,
            TrackingStatus::NoFace => 2,
            TrackingStatus::DetectionError => 3,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => TrackingStatus::Tracking,
            2 => TrackingStatus::NoFace,
            3 => TrackingStatus::DetectionError,
            _ => TrackingStatus::Initializing,
        }
    }
}

/// Read-only view of a focus session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FocusSnapshot {
    pub presence: bool,
    pub raw_score: f64,
    pub smoothed_score: f64,
    pub idle_seconds: u64,
    pub alert_active: bool,
    pub alert_reason: AlertReason,
    pub status: TrackingStatus,
    pub frames_processed: u64,
    pub detection_errors: u64,
}

impl FocusSnapshot {
    /// Smoothed score as a whole percentage.
    pub fn focus_percent(&self) -> u8 {
        (self.smoothed_score.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    pub fn alert_message(&self) -> &'static str {
        self.alert_reason.message()
    }
}

/// Lock-free storage behind [`FocusSnapshot`].
///
/// Every field has exactly one writing loop: presence, scores, status and
/// frame counters belong to the detection loop; idle seconds and the alert
/// belong to the tick loop. Readers may observe fields from different
/// updates but never a torn value.
#[derive(Debug)]
pub struct SnapshotCell {
    presence: AtomicBool,
    raw_score: AtomicU64,
    smoothed_score: AtomicU64,
    status: AtomicU8,
    frames_processed: AtomicU64,
    detection_errors: AtomicU64,
    last_frame_ms: AtomicU64,

    idle_seconds: AtomicU64,
    // active is implied by reason != None, so one atomic keeps the pair consistent
    alert_reason: AtomicU8,
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self {
            presence: AtomicBool::new(false),
            raw_score: AtomicU64::new(0f64.to_bits()),
            smoothed_score: AtomicU64::new(0f64.to_bits()),
            status: AtomicU8::new(TrackingStatus::Initializing.to_u8()),
            frames_processed: AtomicU64::new(0),
            detection_errors: AtomicU64::new(0),
            last_frame_ms: AtomicU64::new(NO_FRAME),
            idle_seconds: AtomicU64::new(0),
            alert_reason: AtomicU8::new(AlertReason::None.to_u8()),
        }
    }
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> FocusSnapshot {
        let alert_reason = AlertReason::from_u8(self.alert_reason.load(Ordering::Relaxed));
        FocusSnapshot {
            presence: self.presence.load(Ordering::Relaxed),
            raw_score: f64::from_bits(self.raw_score.load(Ordering::Relaxed)),
            smoothed_score: f64::from_bits(self.smoothed_score.load(Ordering::Relaxed)),
            idle_seconds: self.idle_seconds.load(Ordering::Relaxed),
            alert_active: alert_reason != AlertReason::None,
            alert_reason,
            status: TrackingStatus::from_u8(self.status.load(Ordering::Relaxed)),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            detection_errors: self.detection_errors.load(Ordering::Relaxed),
        }
    }

    pub fn presence(&self) -> bool {
        self.presence.load(Ordering::Relaxed)
    }

    pub fn last_frame_ms(&self) -> Option<u64> {
        match self.last_frame_ms.load(Ordering::Relaxed) {
            NO_FRAME => None,
            ms => Some(ms),
        }
    }

    /// Only called while neither loop is running.
    pub(crate) fn reset(&self) {
        self.presence.store(false, Ordering::Relaxed);
        self.raw_score.store(0f64.to_bits(), Ordering::Relaxed);
        self.smoothed_score.store(0f64.to_bits(), Ordering::Relaxed);
        self.status.store(TrackingStatus::Initializing.to_u8(), Ordering::Relaxed);
        self.frames_processed.store(0, Ordering::Relaxed);
        self.detection_errors.store(0, Ordering::Relaxed);
        self.last_frame_ms.store(NO_FRAME, Ordering::Relaxed);
        self.idle_seconds.store(0, Ordering::Relaxed);
        self.alert_reason.store(AlertReason::None.to_u8(), Ordering::Relaxed);
    }

    // detection loop

    pub(crate) fn record_frame(
        &self,
        presence: bool,
        score: FocusScore,
        status: TrackingStatus,
        at_ms: u64,
    ) {
        self.raw_score.store(score.raw.to_bits(), Ordering::Relaxed);
        self.smoothed_score.store(score.smoothed.to_bits(), Ordering::Relaxed);
        self.status.store(status.to_u8(), Ordering::Relaxed);
        self.presence.store(presence, Ordering::Relaxed);
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        self.last_frame_ms.store(at_ms, Ordering::Relaxed);
    }

    pub(crate) fn record_detection_error(&self) {
        self.detection_errors.fetch_add(1, Ordering::Relaxed);
    }

    // tick loop

    pub(crate) fn record_tick(&self, idle_seconds: u64, alert: AlertState) {
        let reason = if alert.active { alert.reason } else { AlertReason::None };
        self.idle_seconds.store(idle_seconds, Ordering::Relaxed);
        self.alert_reason.store(reason.to_u8(), Ordering::Relaxed);
    }
}
