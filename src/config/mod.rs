//! Immutable runtime configuration, built once at startup from environment
//! variables and passed explicitly into every component's constructor.
//! There is no process-wide mutable settings object that components reach
//! into on their own.

use std::time::Duration;

use crate::error::{RuntimeError, RuntimeResult};
use crate::scheduler::{RedisSchedulerConfig, SchedulerKind};

#[derive(Debug, Clone)]
pub enum StorageKind {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub storage: StorageKind,
    pub scheduler: SchedulerKind,
    pub global_webhook_url: Option<String>,
    pub global_webhook_token: Option<String>,
    pub push_notifications_enabled: bool,
}

impl RuntimeConfig {
    /// Loads `.env` (if present, without overriding already-set variables),
    /// then reads the core variable table.
    pub fn from_env() -> RuntimeResult<Self> {
        dotenvy::dotenv().ok();

        let storage_type = env_or("STORAGE_TYPE", "memory");
        let storage = match storage_type.as_str() {
            "memory" => StorageKind::Memory,
            "postgres" => StorageKind::Postgres {
                database_url: require_env("DATABASE_URL")?,
            },
            other => {
                return Err(RuntimeError::Configuration(format!(
                    "invalid STORAGE_TYPE {other:?}, expected \"memory\" or \"postgres\""
                )))
            }
        };

        let scheduler_type = env_or("SCHEDULER_TYPE", "memory");
        let scheduler = match scheduler_type.as_str() {
            "memory" => SchedulerKind::Memory { capacity: 1024 },
            "redis" => SchedulerKind::Redis(RedisSchedulerConfig {
                redis_url: require_env("REDIS_URL")?,
                queue_name: "bindu:tasks".to_string(),
                max_connections: 10,
                poll_timeout: Duration::from_secs(1),
            }),
            other => {
                return Err(RuntimeError::Configuration(format!(
                    "invalid SCHEDULER_TYPE {other:?}, expected \"memory\" or \"redis\""
                )))
            }
        };

        Ok(Self {
            storage,
            scheduler,
            global_webhook_url: std::env::var("WEBHOOK_URL").ok(),
            global_webhook_token: std::env::var("WEBHOOK_TOKEN").ok(),
            push_notifications_enabled: true,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> RuntimeResult<String> {
    std::env::var(key).map_err(|_| RuntimeError::Configuration(format!("missing required env var {key}")))
}
