use std::path::PathBuf;
use std::time::Duration;

use focus_algo::{FeatureConfig, LostScorePolicy, ScoreWeights, ScoringConfig};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub log_level: String,
    pub session: SessionConfig,
    pub replay: ReplayConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            log_level,
            session: SessionConfig::from_env(),
            replay: ReplayConfig::from_env(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tick_interval: Duration,
    pub idle_threshold_secs: u64,
    /// When set, the alert tick treats the face as absent if no frame has
    /// arrived for this long, even though the last frame had a face.
    pub presence_stale_after: Option<Duration>,
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            idle_threshold_secs: 15,
            presence_stale_after: None,
            features: FeatureConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let tick_ms = env_u64("FOCUS_TICK_INTERVAL_MS", 1000).max(1);
        let idle_threshold_secs =
            env_u64("FOCUS_IDLE_THRESHOLD_SECS", defaults.idle_threshold_secs);
        let presence_stale_after =
            env_opt_u64("FOCUS_PRESENCE_STALE_MS").map(Duration::from_millis);

        Self {
            tick_interval: Duration::from_millis(tick_ms),
            idle_threshold_secs,
            presence_stale_after,
            features: features_from_env(defaults.features),
            scoring: scoring_from_env(defaults.scoring),
        }
    }
}

fn features_from_env(defaults: FeatureConfig) -> FeatureConfig {
    FeatureConfig {
        min_landmarks: env_u64("FOCUS_MIN_LANDMARKS", defaults.min_landmarks as u64) as usize,
        iris_z_threshold: env_f64("FOCUS_IRIS_Z_THRESHOLD", defaults.iris_z_threshold),
    }
}

fn scoring_from_env(defaults: ScoringConfig) -> ScoringConfig {
    let weights = ScoreWeights {
        ear: env_f64("FOCUS_WEIGHT_EAR", defaults.weights.ear),
        pose: env_f64("FOCUS_WEIGHT_POSE", defaults.weights.pose),
        iris: env_f64("FOCUS_WEIGHT_IRIS", defaults.weights.iris),
        jitter: env_f64("FOCUS_WEIGHT_JITTER", defaults.weights.jitter),
    };

    let lost_policy = std::env::var("FOCUS_LOST_POLICY")
        .ok()
        .as_deref()
        .and_then(LostScorePolicy::parse)
        .unwrap_or(defaults.lost_policy);

    ScoringConfig {
        weights,
        alpha: env_f64("FOCUS_EMA_ALPHA", defaults.alpha),
        lost_policy,
        ..defaults
    }
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub path: Option<PathBuf>,
    pub frame_interval: Duration,
}

impl ReplayConfig {
    fn from_env() -> Self {
        Self {
            path: std::env::var("FOCUS_REPLAY_PATH").ok().map(PathBuf::from),
            frame_interval: Duration::from_millis(env_u64("FOCUS_REPLAY_FRAME_MS", 33)),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_opt_u64(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}
