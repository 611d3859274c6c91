//! Circuit breaker configuration.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures required to trip the circuit open.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing a half-open probe.
    pub timeout: Duration,
    /// Consecutive successes in half-open required to close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}
