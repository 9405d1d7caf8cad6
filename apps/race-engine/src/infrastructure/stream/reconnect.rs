//! Reconnection Policy
//!
//! One configurable backoff policy shared by all reconnect paths: bounded
//! attempts, base delay doubling each attempt, jittered, capped.

use std::time::Duration;

use rand::Rng;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub base_delay: Duration,
    /// Cap on the delay between attempts.
    pub max_delay: Duration,
    /// Backoff multiplier applied after each attempt.
    pub multiplier: f64,
    /// Jitter fraction applied to each delay (0.1 = plus or minus 10%).
    pub jitter_factor: f64,
    /// Attempt bound; exceeding it is a fatal condition for the connection.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 5,
        }
    }
}

/// Exponential backoff with jitter and a hard attempt bound.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    next_delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    /// Create a policy from configuration.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let next_delay = config.base_delay;
        Self {
            config,
            next_delay,
            attempts: 0,
        }
    }

    /// Delay to sleep before the next attempt, or `None` once the bound is
    /// exhausted.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.config.max_attempts {
            return None;
        }
        self.attempts += 1;

        let delay = self.jittered(self.next_delay);

        let scaled = self.next_delay.as_secs_f64() * self.config.multiplier;
        self.next_delay = Duration::from_secs_f64(scaled).min(self.config.max_delay);

        Some(delay)
    }

    /// Reset after a successful connection.
    pub const fn reset(&mut self) {
        self.next_delay = self.config.base_delay;
        self.attempts = 0;
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return delay;
        }
        let base = delay.as_secs_f64();
        let spread = base * self.config.jitter_factor;
        let offset = rand::rng().random_range(-spread..=spread);
        Duration::from_secs_f64((base + offset).max(0.001))
    }
}
