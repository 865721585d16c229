use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Uniform draw from `[0, 1)` used to spread the first heartbeat.
#[must_use]
pub fn random_jitter() -> f64 {
    rand::random::<f64>()
}

/// Keep-alive schedule: the first beat lands `interval * jitter` after start,
/// every later one exactly `interval` after the previous.
pub struct Heartbeat {
    ticker: Interval,
    first_delay: Duration,
}

impl Heartbeat {
    #[must_use]
    pub fn start(interval_ms: u64, jitter: f64) -> Self {
        let interval = Duration::from_millis(interval_ms.max(1));
        let first_delay = interval.mul_f64(jitter.clamp(0.0, 1.0));

        let mut ticker = interval_at(Instant::now() + first_delay, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            ticker,
            first_delay,
        }
    }

    #[must_use]
    pub const fn first_delay(&self) -> Duration {
        self.first_delay
    }

    /// Completes when the next heartbeat is due. Cancel safe.
    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}
