//! Webhook configuration: the record a task registers so the Push-Notification
//! Manager knows where (and how) to deliver lifecycle/artifact events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Primary key in the `webhook_configs` table; also the task this
    /// config is registered for.
    pub task_id: Uuid,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Opaque validator metadata (e.g. a signing-secret identifier); not
    /// interpreted by the runtime, passed through from registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookConfig {
    pub fn new(task_id: Uuid, url: impl Into<String>, token: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            url: url.into(),
            token,
            validator: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
