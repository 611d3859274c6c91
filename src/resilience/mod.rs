//! Circuit breaker primitives shared by every component that crosses a
//! network boundary (Scheduler's Redis transport, the Push Manager's HTTP
//! client).

pub mod behavior;
pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use behavior::CircuitBreakerBehavior;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
