//! Redis list transport: one list per queue name, `rpush`/`blpop`. The
//! consumer loop logs and continues past deserialization/transport errors
//! rather than halting, and every operation is gated by a circuit breaker
//! with jittered retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, error, warn};

use crate::models::QueueEnvelope;
use crate::resilience::CircuitBreaker;

use super::config::{RedisSchedulerConfig, RetryPolicy};
use super::error::SchedulerError;

#[derive(Debug)]
pub struct RedisScheduler {
    config: RedisSchedulerConfig,
    connection: ConnectionManager,
    retry_policy: RetryPolicy,
    circuit_breaker: CircuitBreaker,
    shutting_down: AtomicBool,
}

impl RedisScheduler {
    /// Acquire: opens the connection manager and pings, per the scoped
    /// resource acquire/release contract.
    pub async fn connect(config: RedisSchedulerConfig) -> Result<Self, SchedulerError> {
        let client = redis::Client::open(config.redis_url.clone())
            .map_err(|e| SchedulerError::Connection(e.to_string()))?;
        let mut connection = client
            .get_connection_manager()
            .await
            .map_err(|e| SchedulerError::Connection(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
            .map_err(|e| SchedulerError::Connection(format!("ping failed: {e}")))?;

        debug!(redis_url = %config.redis_url, queue = %config.queue_name, "scheduler connected");

        Ok(Self {
            circuit_breaker: CircuitBreaker::new(
                format!("scheduler-redis:{}", config.queue_name),
                Default::default(),
            ),
            config,
            connection,
            retry_policy: RetryPolicy::default(),
            shutting_down: AtomicBool::new(false),
        })
    }

    async fn push_with_retry(&self, envelope: &QueueEnvelope) -> Result<(), SchedulerError> {
        let payload = serde_json::to_string(envelope)?;
        let mut attempt = 0;
        loop {
            if !self.circuit_breaker.should_allow() {
                return Err(SchedulerError::Transport(
                    "circuit breaker open for scheduler transport".to_string(),
                ));
            }
            let start = Instant::now();
            let mut conn = self.connection.clone();
            let result: Result<(), redis::RedisError> = conn
                .rpush(&self.config.queue_name, payload.clone())
                .await
                .map(|_: i64| ());

            match result {
                Ok(()) => {
                    self.circuit_breaker.record_success_manual(start.elapsed());
                    debug!(operation = %envelope.operation.kind(), "pushed task operation");
                    return Ok(());
                }
                Err(e) => {
                    self.circuit_breaker.record_failure_manual(start.elapsed());
                    attempt += 1;
                    if attempt >= self.retry_policy.max_attempts {
                        error!(error = %e, attempt, "giving up pushing task operation");
                        return Err(SchedulerError::Transport(e.to_string()));
                    }
                    warn!(error = %e, attempt, "retrying scheduler push");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
            }
        }
    }

    pub async fn push(&self, envelope: QueueEnvelope) -> Result<(), SchedulerError> {
        self.push_with_retry(&envelope).await
    }

    /// One `blpop` cycle. Returns `Ok(None)` on a poll timeout (normal, lets
    /// the caller check for shutdown between reads) or once shutdown has
    /// been requested. Deserialization and transport errors are logged and
    /// swallowed so a single malformed message never halts the loop.
    pub async fn recv(&self) -> Option<QueueEnvelope> {
        loop {
            if self.shutting_down.load(Ordering::Acquire) {
                return None;
            }

            let mut conn = self.connection.clone();
            let result: Result<Option<(String, String)>, redis::RedisError> = conn
                .blpop(&self.config.queue_name, self.config.poll_timeout.as_secs_f64())
                .await;

            match result {
                Ok(Some((_, raw))) => match serde_json::from_str::<QueueEnvelope>(&raw) {
                    Ok(envelope) => return Some(envelope),
                    Err(e) => {
                        error!(error = %e, "failed to deserialize task operation, dropping");
                        continue;
                    }
                },
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "redis error receiving task operations, retrying");
                    tokio::time::sleep(self.retry_policy.base_delay).await;
                    continue;
                }
            }
        }
    }

    pub async fn queue_length(&self) -> Result<u64, SchedulerError> {
        let mut conn = self.connection.clone();
        conn.llen(&self.config.queue_name)
            .await
            .map_err(|e| SchedulerError::Transport(e.to_string()))
    }

    pub async fn clear_queue(&self) -> Result<u64, SchedulerError> {
        let mut conn = self.connection.clone();
        conn.del(&self.config.queue_name)
            .await
            .map_err(|e| SchedulerError::Transport(e.to_string()))
    }

    pub async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }

    /// Release: signals the consumer loop to stop and drops the connection.
    pub fn close(&self) {
        self.shutting_down.store(true, Ordering::Release);
    }
}
