use std::time::Duration;

use crate::config::TokenWindowConfig;

/// Fixed-window token counter keyed on host wall-clock nanoseconds.
///
/// The window refills to `capacity` on the first observation and whenever
/// `now > window_start + window`. Refilling never happens mid-window, and
/// observing the window never consumes a token; only `try_take` does.
#[derive(Debug, Clone)]
pub struct TokenWindow {
    capacity: u64,
    window_nanos: u64,
    remaining: u64,
    /// `None` until the first observation.
    window_start_nanos: Option<u64>,
}

/// Outcome of [`TokenWindow::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Refilled,
    Unchanged,
}

impl TokenWindow {
    pub fn new(capacity: u64, window: Duration) -> Self {
        Self {
            capacity,
            window_nanos: u64::try_from(window.as_nanos()).unwrap_or(u64::MAX),
            remaining: 0,
            window_start_nanos: None,
        }
    }

    pub fn from_config(cfg: &TokenWindowConfig) -> Self {
        Self::new(cfg.capacity, Duration::from_nanos(cfg.window_nanos()))
    }

    /// Advance the window to `now_nanos`, refilling if it has expired.
    pub fn refresh(&mut self, now_nanos: u64) -> Refresh {
        let expired = match self.window_start_nanos {
            None => true,
            Some(start) => now_nanos > start.saturating_add(self.window_nanos),
        };
        if expired {
            self.remaining = self.capacity;
            self.window_start_nanos = Some(now_nanos);
            Refresh::Refilled
        } else {
            Refresh::Unchanged
        }
    }

    /// Consume one token if any remain in the current window.
    pub fn try_take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Start of the current window, or 0 before the first observation.
    pub fn window_start_nanos(&self) -> u64 {
        self.window_start_nanos.unwrap_or(0)
    }

    /// Time until the current window expires, measured from `now_nanos`.
    pub fn retry_after(&self, now_nanos: u64) -> Duration {
        match self.window_start_nanos {
            None => Duration::ZERO,
            Some(start) => {
                let end = start.saturating_add(self.window_nanos);
                Duration::from_nanos(end.saturating_sub(now_nanos))
            }
        }
    }
}
