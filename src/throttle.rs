//! Minimum-interval gate for high-frequency input
//!
//! Times are milliseconds from any monotonic-enough clock
//! (`Date.now()` in the browser, a counter in tests).

#[derive(Debug, Clone)]
pub struct Throttle {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl Throttle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// True if at least `interval_ms` passed since the last mark
    pub fn ready(&self, now_ms: f64) -> bool {
        self.last_ms.is_none_or(|last| now_ms - last >= self.interval_ms)
    }

    pub fn mark(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
    }

    /// `ready` + `mark` in one step
    pub fn try_fire(&mut self, now_ms: f64) -> bool {
        if self.ready(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }
}
