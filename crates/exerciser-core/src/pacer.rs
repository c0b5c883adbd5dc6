//! Fixed-interval ticker for worker lanes.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Fires once per period, starting one period after creation.
///
/// Missed ticks do not queue: a consumer that falls behind gets a single
/// immediate tick and then resumes on its regular schedule.
#[derive(Debug)]
pub struct Pacer {
    interval: Interval,
}

impl Pacer {
    /// # Panics
    ///
    /// Panics if `period` is zero. `ExerciserConfig::validate` rejects that.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}
