/// Default quiz length: 30 minutes.
pub const DEFAULT_TIMER_SECONDS: u32 = 1800;

/// Below this many seconds the display switches to its warning state.
pub const LOW_TIME_THRESHOLD: u32 = 300;

/// Countdown clock for one quiz attempt.
///
/// This is only the state; `quiz_timer` owns the task that calls `tick` once
/// a second while the countdown is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    initial_seconds: u32,
    remaining_seconds: u32,
    running: bool,
}

impl Countdown {
    pub fn new(initial_seconds: u32) -> Self {
        Self {
            initial_seconds,
            remaining_seconds: initial_seconds,
            running: false,
        }
    }

    pub fn initial_seconds(&self) -> u32 {
        self.initial_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }

    pub fn is_low_on_time(&self) -> bool {
        self.remaining_seconds < LOW_TIME_THRESHOLD
    }

    /// Returns whether the countdown is running afterwards. An expired
    /// countdown cannot be started.
    pub fn start(&mut self) -> bool {
        if self.remaining_seconds > 0 {
            self.running = true;
        }
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.remaining_seconds = self.initial_seconds;
        self.running = false;
    }

    /// Advance by one second. Returns the new remaining time, or `None` if the
    /// countdown was not running. Reaching zero stops the countdown.
    pub fn tick(&mut self) -> Option<u32> {
        if !self.running || self.remaining_seconds == 0 {
            return None;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.running = false;
        }
        Some(self.remaining_seconds)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_TIMER_SECONDS)
    }
}
