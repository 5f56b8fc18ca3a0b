// src/pipeline/throttle.rs
use std::{thread, time::Duration};

/// Pacing policy applied between consecutive requests.
pub trait Throttle {
    /// Block until the next request may be sent.
    fn pause(&mut self);
}

/// Sleep for a constant interval.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Throttle for FixedDelay {
    fn pause(&mut self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}
