use std::time::Duration;
use tokio::time::Instant;

use super::error::{ControlError, ControlResult};

/// Upper bound attached to every blocking poll. Expiry surfaces as `ControlError::Timeout`.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fails with a `Timeout` naming what was being waited for once the deadline has passed.
    pub fn check(&self, waiting_for: &str) -> ControlResult<()> {
        if self.expired() {
            return Err(ControlError::Timeout {
                waiting_for: waiting_for.to_string(),
                elapsed: self.elapsed(),
            });
        }
        Ok(())
    }

    /// Sleep for `interval`, never past the deadline.
    pub async fn sleep(&self, interval: Duration) {
        tokio::time::sleep(interval.min(self.remaining())).await;
    }
}
