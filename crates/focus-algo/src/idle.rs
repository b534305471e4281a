/// Pointer idleness, measured in whole seconds on a fixed tick.
///
/// Timestamps are milliseconds on any monotonic clock shared by the caller;
/// the monitor never reads a clock itself.
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    last_activity_ms: u64,
    idle_seconds: u64,
}

impl IdleMonitor {
    /// `started_ms` counts as the first activity, so a fresh session is not idle.
    pub fn new(started_ms: u64) -> Self {
        Self {
            last_activity_ms: started_ms,
            idle_seconds: 0,
        }
    }

    /// Out-of-order timestamps never move the activity mark backwards.
    pub fn record_activity(&mut self, at_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(at_ms);
    }

    pub fn tick(&mut self, now_ms: u64) -> u64 {
        self.idle_seconds = now_ms.saturating_sub(self.last_activity_ms) / 1000;
        self.idle_seconds
    }

    pub fn idle_seconds(&self) -> u64 {
        self.idle_seconds
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }
}
