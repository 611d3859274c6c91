//! Outbound webhook HTTP delivery: POST the event body,
//! bearer-auth if a token is configured, retry 5xx/network errors with
//! backoff, never retry 4xx.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::models::{PushEvent, WebhookConfig};
use crate::resilience::CircuitBreaker;

use super::error::PushError;

const TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct DeliveryClient {
    http: reqwest::Client,
}

impl DeliveryClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .expect("reqwest client config is static and known-valid");
        Self { http }
    }

    pub async fn deliver(
        &self,
        config: &WebhookConfig,
        event: &PushEvent,
        circuit_breaker: &CircuitBreaker,
    ) -> Result<(), PushError> {
        let mut attempt = 0;
        loop {
            if !circuit_breaker.should_allow() {
                return Err(PushError::Delivery(
                    "circuit breaker open for webhook delivery".to_string(),
                ));
            }

            let start = Instant::now();
            let mut request = self.http.post(&config.url).json(event);
            if let Some(token) = &config.token {
                request = request.bearer_auth(token);
            }

            let outcome = request.send().await;
            match outcome {
                Ok(response) if response.status().is_success() => {
                    circuit_breaker.record_success_manual(start.elapsed());
                    debug!(
                        task_id = %event.task_id,
                        sequence = event.sequence,
                        kind = ?event.payload_kind(),
                        attempt,
                        "webhook delivered"
                    );
                    return Ok(());
                }
                Ok(response) if response.status().is_client_error() => {
                    circuit_breaker.record_failure_manual(start.elapsed());
                    let status = response.status().as_u16();
                    warn!(
                        task_id = %event.task_id,
                        sequence = event.sequence,
                        status,
                        "webhook rejected, not retrying"
                    );
                    return Err(PushError::ClientError(status));
                }
                Ok(response) => {
                    circuit_breaker.record_failure_manual(start.elapsed());
                    attempt += 1;
                    let status = response.status().as_u16();
                    if attempt >= MAX_ATTEMPTS {
                        return Err(PushError::Delivery(format!(
                            "webhook returned status {status} after {attempt} attempts"
                        )));
                    }
                    warn!(task_id = %event.task_id, status, attempt, "retrying webhook delivery");
                    tokio::time::sleep(BASE_DELAY * 2u32.pow(attempt - 1)).await;
                }
                Err(e) => {
                    circuit_breaker.record_failure_manual(start.elapsed());
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(PushError::Delivery(e.to_string()));
                    }
                    warn!(task_id = %event.task_id, error = %e, attempt, "retrying webhook delivery");
                    tokio::time::sleep(BASE_DELAY * 2u32.pow(attempt - 1)).await;
                }
            }
        }
    }
}

impl Default for DeliveryClient {
    fn default() -> Self {
        Self::new()
    }
}
