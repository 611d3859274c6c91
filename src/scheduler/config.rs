//! Scheduler configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub enum SchedulerKind {
    Memory { capacity: usize },
    Redis(RedisSchedulerConfig),
}

#[derive(Debug, Clone)]
pub struct RedisSchedulerConfig {
    pub redis_url: String,
    pub queue_name: String,
    pub max_connections: u32,
    pub poll_timeout: Duration,
}

impl Default for RedisSchedulerConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            queue_name: "bindu:tasks".to_string(),
            max_connections: 10,
            poll_timeout: Duration::from_secs(1),
        }
    }
}

/// Producer-side retry policy: exponential backoff with a
/// cap, applied before a transport error is surfaced to the caller.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Exponential delay for `attempt`, capped, with up to 20% jitter so a
    /// burst of producers retrying together doesn't hammer the transport in
    /// lockstep.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.saturating_mul(1 << attempt.min(16));
        let capped = scaled.min(self.max_delay);
        let jitter_frac = fastrand::f64() * 0.2;
        capped + capped.mul_f64(jitter_frac)
    }
}
