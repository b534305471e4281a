use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    #[default]
    None,
    NoFace,
    Idle,
}

impl AlertReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertReason::None => "none",
            AlertReason::NoFace => "no_face",
            AlertReason::Idle => "idle",
        }
    }

    /// Learner-facing text for the alert banner.
    pub const fn message(self) -> &'static str {
        match self {
            AlertReason::None => "No alerts right now. Keep up the great work!",
            AlertReason::NoFace => "No face detected. Please stay visible on camera.",
            AlertReason::Idle => "Mouse has been idle for too long.",
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            AlertReason::None => 0,
            AlertReason::NoFace => 1,
            AlertReason::Idle => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => AlertReason::NoFace,
            2 => AlertReason::Idle,
            _ => AlertReason::None,
        }
    }
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertState {
    pub active: bool,
    pub reason: AlertReason,
}

impl AlertState {
    pub const fn clear() -> Self {
        Self {
            active: false,
            reason: AlertReason::None,
        }
    }

    pub const fn raised(reason: AlertReason) -> Self {
        Self { active: true, reason }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertUpdate {
    pub state: AlertState,
    pub previous: AlertState,
    pub changed: bool,
}

/// Combines presence and idleness into one alert, re-evaluated each tick.
#[derive(Debug, Clone)]
pub struct AlertAggregator {
    idle_threshold_secs: u64,
    current: AlertState,
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new(15)
    }
}

impl AlertAggregator {
    pub fn new(idle_threshold_secs: u64) -> Self {
        Self {
            idle_threshold_secs,
            current: AlertState::clear(),
        }
    }

    pub fn idle_threshold_secs(&self) -> u64 {
        self.idle_threshold_secs
    }

    pub fn current(&self) -> AlertState {
        self.current
    }

    /// A missing face always wins over idleness.
    pub fn evaluate(&mut self, presence: bool, idle_seconds: u64) -> AlertUpdate {
        let state = if !presence {
            AlertState::raised(AlertReason::NoFace)
        } else if idle_seconds > self.idle_threshold_secs {
            AlertState::raised(AlertReason::Idle)
        } else {
            AlertState::clear()
        };

        let previous = self.current;
        self.current = state;

        AlertUpdate {
            state,
            previous,
            changed: state != previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_has_priority_over_idle() {
        let mut aggregator = AlertAggregator::default();
        let update = aggregator.evaluate(false, 120);
        assert_eq!(update.state, AlertState::raised(AlertReason::NoFace));
    }

    #[test]
    fn test_idle_strictly_above_threshold() {
        let mut aggregator = AlertAggregator::default();
        assert_eq!(aggregator.idle_threshold_secs(), 15);
        assert_eq!(aggregator.evaluate(true, 15).state, AlertState::clear());
        assert_eq!(aggregator.evaluate(true, 16).state, AlertState::raised(AlertReason::Idle));
    }

    #[test]
    fn test_change_tracking() {
        let mut aggregator = AlertAggregator::new(5);
        assert!(!aggregator.evaluate(true, 0).changed);
        let raised = aggregator.evaluate(false, 0);
        assert!(raised.changed);
        assert_eq!(raised.previous, AlertState::clear());
        assert!(!aggregator.evaluate(false, 10).changed);
        let idle = aggregator.evaluate(true, 10);
        assert!(idle.changed);
        assert_eq!(idle.state.reason, AlertReason::Idle);
        assert_eq!(aggregator.current(), idle.state);
    }

    #[test]
    fn test_reason_codes_round_trip() {
        for reason in [AlertReason::None, AlertReason::NoFace, AlertReason::Idle] {
            assert_eq!(AlertReason::from_u8(reason.to_u8()), reason);
        }
        assert_eq!(AlertReason::from_u8(200), AlertReason::None);
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AlertReason::NoFace).unwrap(), "\"no_face\"");
        assert_eq!(AlertReason::Idle.to_string(), "idle");
    }
}
