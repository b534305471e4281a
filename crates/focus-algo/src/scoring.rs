use serde::{Deserialize, Serialize};

use crate::features::{FeatureConfig, FeatureExtractor, FocusSample};
use crate::landmark::FrameLandmarks;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub ear: f64,
    pub pose: f64,
    pub iris: f64,
    pub jitter: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ear: 0.4,
            pose: 0.3,
            iris: 0.3,
            jitter: 0.1,
        }
    }
}

/// What the smoothed score does while no face is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LostScorePolicy {
    /// Keep the last smoothed value untouched.
    #[default]
    Freeze,
    /// Feed a raw score of 0 through the EMA on every lost frame.
    Decay,
}

impl LostScorePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "freeze" => Some(Self::Freeze),
            "decay" => Some(Self::Decay),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Freeze => "freeze",
            Self::Decay => "decay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// EAR at or below which the eye score is 0.
    pub ear_closed: f64,
    /// EAR span over which the eye score ramps from 0 to 1.
    pub ear_range: f64,
    /// Head deviation tolerated before the pose score drops.
    pub pose_tolerance: f64,
    pub pose_gain: f64,
    /// Iris term when at least one iris is hidden.
    pub iris_partial_penalty: f64,
    pub jitter_gain: f64,
    /// EMA weight of the newest raw score.
    pub alpha: f64,
    #[serde(default)]
    pub lost_policy: LostScorePolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            ear_closed: 0.15,
            ear_range: 0.10,
            pose_tolerance: 0.03,
            pose_gain: 10.0,
            iris_partial_penalty: 0.5,
            jitter_gain: 50.0,
            alpha: 0.25,
            lost_policy: LostScorePolicy::Freeze,
        }
    }
}

impl ScoringConfig {
    /// Smoothing factor restricted to (0, 1].
    pub fn effective_alpha(&self) -> f64 {
        if self.alpha.is_finite() {
            self.alpha.clamp(f64::EPSILON, 1.0)
        } else {
            ScoringConfig::default().alpha
        }
    }

    pub fn score(&self, sample: &FocusSample) -> ScoreBreakdown {
        let ear_score = if self.ear_range > 0.0 {
            clamp_unit((sample.avg_ear() - self.ear_closed) / self.ear_range)
        } else if sample.avg_ear() > self.ear_closed {
            1.0
        } else {
            0.0
        };

        let pose_excess = (sample.head_deviation - self.pose_tolerance).max(0.0);
        let pose_score = clamp_unit(1.0 - pose_excess * self.pose_gain);

        let iris_penalty = if sample.irises_visible() {
            1.0
        } else {
            clamp_unit(self.iris_partial_penalty)
        };

        let jitter_penalty = clamp_unit(sample.jitter * self.jitter_gain);

        let w = &self.weights;
        let raw = clamp_unit(
            ear_score * w.ear + pose_score * w.pose + iris_penalty * w.iris
                - jitter_penalty * w.jitter,
        );

        ScoreBreakdown {
            ear_score,
            pose_score,
            iris_penalty,
            jitter_penalty,
            raw,
        }
    }
}

/// Clamps to [0, 1]; NaN collapses to 0.
#[inline]
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub ear_score: f64,
    pub pose_score: f64,
    pub iris_penalty: f64,
    pub jitter_penalty: f64,
    pub raw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Tracking,
    Lost,
}

impl TrackingState {
    pub const fn as_str(self) -> &'static str {
        match self {
            TrackingState::Tracking => "TRACKING",
            TrackingState::Lost => "LOST",
        }
    }

    pub const fn is_tracking(self) -> bool {
        matches!(self, TrackingState::Tracking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusScore {
    pub raw: f64,
    pub smoothed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub state: TrackingState,
    pub score: FocusScore,
    pub sample: Option<FocusSample>,
    pub breakdown: Option<ScoreBreakdown>,
    pub state_changed: bool,
}

/// Per-frame focus scoring with EMA smoothing.
///
/// Owns the smoothed accumulator and the previous frame used for jitter.
/// Starts in `Lost` with a smoothed score of 0.
pub struct ScoringEngine {
    extractor: FeatureExtractor,
    config: ScoringConfig,
    state: TrackingState,
    score: FocusScore,
    previous_frame: Option<FrameLandmarks>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(FeatureConfig::default(), ScoringConfig::default())
    }
}

impl ScoringEngine {
    pub fn new(features: FeatureConfig, config: ScoringConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(features),
            config,
            state: TrackingState::Lost,
            score: FocusScore::default(),
            previous_frame: None,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn score(&self) -> FocusScore {
        self.score
    }

    /// Runs one detection frame through extraction and scoring.
    pub fn process(&mut self, frame: FrameLandmarks) -> FrameOutcome {
        let Some(sample) = self.extractor.extract(&frame, self.previous_frame.as_ref()) else {
            return self.mark_lost();
        };

        let breakdown = self.config.score(&sample);
        let state_changed = self.transition(TrackingState::Tracking);
        self.score.raw = breakdown.raw;
        self.score.smoothed = self.smooth(breakdown.raw);
        self.previous_frame = Some(frame);

        FrameOutcome {
            state: self.state,
            score: self.score,
            sample: Some(sample),
            breakdown: Some(breakdown),
            state_changed,
        }
    }

    /// A frame without a usable face: empty detection, rejected geometry or
    /// a detector failure.
    pub fn mark_lost(&mut self) -> FrameOutcome {
        let state_changed = self.transition(TrackingState::Lost);
        self.score.raw = 0.0;
        self.previous_frame = None;

        if self.config.lost_policy == LostScorePolicy::Decay {
            self.score.smoothed = self.smooth(0.0);
        }

        FrameOutcome {
            state: self.state,
            score: self.score,
            sample: None,
            breakdown: None,
            state_changed,
        }
    }

    pub fn set_smoothed(&mut self, value: f64) {
        self.score.smoothed = clamp_unit(value);
    }

    pub fn reset(&mut self) {
        self.state = TrackingState::Lost;
        self.score = FocusScore::default();
        self.previous_frame = None;
    }

    fn smooth(&self, raw: f64) -> f64 {
        let alpha = self.config.effective_alpha();
        clamp_unit(alpha * raw + (1.0 - alpha) * self.score.smoothed)
    }

    fn transition(&mut self, next: TrackingState) -> bool {
        let changed = self.state != next;
        self.state = next;
        changed
    }
}
