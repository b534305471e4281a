use crate::scoring::TrackingState;

/// Face presence, derived solely from the scoring state of the latest frame.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    present: bool,
    transitions: u64,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest frame's state; returns true if presence flipped.
    pub fn observe(&mut self, state: TrackingState) -> bool {
        let present = state.is_tracking();
        let flipped = present != self.present;
        if flipped {
            self.transitions += 1;
        }
        self.present = present;
        flipped
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
