use std::time::Duration;

use rand::Rng;

/// Exponential reconnect delay with proportional jitter.
#[derive(Clone, Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 0.2)
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delay before the next attempt: `base * 2^attempt`, capped at `max`,
    /// then scaled by `1 ± jitter_factor`.
    pub fn next_delay(&mut self) -> Duration {
        let exp_ms = self.base.as_millis() as f64 * 2.0_f64.powi(self.attempt.min(30) as i32);
        let capped = exp_ms.min(self.max.as_millis() as f64);
        self.attempt = self.attempt.saturating_add(1);

        let spread = capped * self.jitter_factor;
        let jitter = if spread > 0.0 {
            rand::thread_rng().gen_range(-spread..=spread)
        } else {
            0.0
        };
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}
