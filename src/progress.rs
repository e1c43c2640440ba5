use std::time::Duration;
use tracing::{error, info};

/// Receives progress events from load, split and merge runs.
pub trait ProgressReporter: Send + Sync {
    fn progress(&self, current: usize, total: usize, message: &str);

    /// Terminal failure of a run, reported once.
    fn failed(&self, message: &str);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn progress(&self, current: usize, total: usize, message: &str) {
        info!("[{}/{}] {}", current, total, message);
    }

    fn failed(&self, message: &str) {
        error!("{}", message);
    }
}

/// Pause inserted between extraction steps and between deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub step_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            step_delay: Duration::from_millis(10),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Pacing {
            step_delay: Duration::ZERO,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Pacing {
            step_delay: Duration::from_millis(millis),
        }
    }

    /// Let other tasks run.
    pub async fn yield_now(&self) {
        tokio::task::yield_now().await;
    }

    pub async fn pause(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }
}
