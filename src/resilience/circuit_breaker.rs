//! Generic circuit breaker: closed -> open on consecutive failures ->
//! half-open probe after a timeout -> closed after consecutive successes.
//!
//! Every component that crosses a network boundary (Scheduler's Redis
//! transport, the Push Manager's outbound HTTP client) can wrap its calls in
//! one of these for fault isolation, additive to the retry/backoff policy
//! each component already implements on its own.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::behavior::CircuitBreakerBehavior;
use super::config::CircuitBreakerConfig;
use super::metrics::CircuitBreakerMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            // Invalid values default to Open: the safest failure mode is to
            // reject calls rather than silently let them through.
            _ => CircuitState::Open,
        }
    }
}

impl From<CircuitState> for u8 {
    fn from(value: CircuitState) -> Self {
        match value {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            state: AtomicU8::new(CircuitState::Closed.into()),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            total_calls: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            opened_at: Mutex::new(None),
        }
    }

    fn set_state(&self, state: CircuitState) {
        self.state.store(state.into(), Ordering::SeqCst);
    }

    /// Returns whether the next call is allowed, transitioning Open ->
    /// HalfOpen in place once the recovery timeout has elapsed.
    pub fn should_allow(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = {
                    let guard = self.opened_at.lock().expect("opened_at mutex poisoned");
                    guard.map(|at| at.elapsed())
                };
                if elapsed.is_some_and(|e| e >= self.config.timeout) {
                    self.set_state(CircuitState::HalfOpen);
                    self.consecutive_successes.store(0, Ordering::SeqCst);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success_manual(&self, _duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::SeqCst);

        if self.state() == CircuitState::HalfOpen {
            let successes = self.consecutive_successes.fetch_add(1, Ordering::SeqCst) + 1;
            if successes >= self.config.success_threshold {
                self.set_state(CircuitState::Closed);
                self.consecutive_successes.store(0, Ordering::SeqCst);
                *self.opened_at.lock().expect("opened_at mutex poisoned") = None;
            }
        }
    }

    pub fn record_failure_manual(&self, _duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_successes.store(0, Ordering::SeqCst);

        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.config.failure_threshold {
            self.force_open();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        CircuitBreakerMetrics {
            total_calls,
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count,
            consecutive_failures: self.consecutive_failures.load(Ordering::SeqCst),
            half_open_calls: 0,
            current_state: self.state(),
            failure_rate: if total_calls == 0 {
                0.0
            } else {
                failure_count as f64 / total_calls as f64
            },
        }
    }
}

impl CircuitBreakerBehavior for CircuitBreaker {
    fn name(&self) -> &str {
        self.name()
    }

    fn state(&self) -> CircuitState {
        self.state()
    }

    fn should_allow(&self) -> bool {
        self.should_allow()
    }

    fn record_success(&self, duration: Duration) {
        self.record_success_manual(duration);
    }

    fn record_failure(&self, duration: Duration) {
        self.record_failure_manual(duration);
    }

    fn is_healthy(&self) -> bool {
        self.metrics().is_healthy()
    }

    fn force_open(&self) {
        self.set_state(CircuitState::Open);
        *self.opened_at.lock().expect("opened_at mutex poisoned") = Some(Instant::now());
        self.consecutive_successes.store(0, Ordering::SeqCst);
    }

    fn force_closed(&self) {
        self.set_state(CircuitState::Closed);
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.consecutive_successes.store(0, Ordering::SeqCst);
        *self.opened_at.lock().expect("opened_at mutex poisoned") = None;
    }

    fn metrics(&self) -> CircuitBreakerMetrics {
        self.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, success_threshold: u32, timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test".to_string(),
            CircuitBreakerConfig {
                failure_threshold,
                timeout,
                success_threshold,
            },
        )
    }

    #[test]
    fn starts_closed_and_allows_calls() {
        let cb = breaker(3, 2, Duration::from_secs(30));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.should_allow());
    }

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = breaker(3, 2, Duration::from_secs(30));
        cb.record_failure_manual(Duration::ZERO);
        cb.record_failure_manual(Duration::ZERO);
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure_manual(Duration::ZERO);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.should_allow());
    }

    #[test]
    fn success_resets_consecutive_failure_count() {
        let cb = breaker(3, 2, Duration::from_secs(30));
        cb.record_failure_manual(Duration::ZERO);
        cb.record_failure_manual(Duration::ZERO);
        cb.record_success_manual(Duration::ZERO);
        assert_eq!(cb.metrics().consecutive_failures, 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_recovers_to_closed_after_success_threshold() {
        let cb = breaker(2, 2, Duration::ZERO);
        cb.record_failure_manual(Duration::ZERO);
        cb.record_failure_manual(Duration::ZERO);
        assert_eq!(cb.state(), CircuitState::Open);

        // Zero timeout: should_allow() transitions Open -> HalfOpen in place.
        assert!(cb.should_allow());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success_manual(Duration::ZERO);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success_manual(Duration::ZERO);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn force_open_and_force_closed_are_immediate() {
        let cb = breaker(5, 2, Duration::from_secs(30));
        cb.force_open();
        assert_eq!(cb.state(), CircuitState::Open);
        cb.force_closed();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.metrics().consecutive_failures, 0);
    }

    #[test]
    fn circuit_state_from_u8_defaults_invalid_to_open() {
        assert_eq!(CircuitState::from(0), CircuitState::Closed);
        assert_eq!(CircuitState::from(2), CircuitState::HalfOpen);
        assert_eq!(CircuitState::from(1), CircuitState::Open);
        assert_eq!(CircuitState::from(255), CircuitState::Open);
    }
}
