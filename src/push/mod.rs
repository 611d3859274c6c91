//! Push-Notification Manager: owns the `task_id ->
//! WebhookConfig` map, resolves per-task vs. global fallback, and dispatches
//! lifecycle/artifact events as webhook POSTs with monotonic sequencing.

pub mod delivery;
pub mod error;
pub mod sequencer;

pub use error::PushError;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{Artifact, PushEvent, TaskState, WebhookConfig};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::storage::Storage;

use delivery::DeliveryClient;
use sequencer::Sequencer;

pub type PushResult<T> = Result<T, PushError>;

/// Synthetic fallback config built from the runtime's global webhook
/// settings, used when a task has no per-task registration.
#[derive(Debug, Clone)]
pub struct GlobalWebhookSettings {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct PushNotificationManager {
    storage: Arc<Storage>,
    configs: DashMap<Uuid, WebhookConfig>,
    global: GlobalWebhookSettings,
    push_notifications_enabled: bool,
    sequencer: Sequencer,
    delivery: DeliveryClient,
    circuit_breaker: CircuitBreaker,
}

impl PushNotificationManager {
    pub fn new(storage: Arc<Storage>, global: GlobalWebhookSettings, push_notifications_enabled: bool) -> Self {
        Self {
            storage,
            configs: DashMap::new(),
            global,
            push_notifications_enabled,
            sequencer: Sequencer::new(),
            delivery: DeliveryClient::new(),
            circuit_breaker: CircuitBreaker::new("push-manager".to_string(), CircuitBreakerConfig::default()),
        }
    }

    /// Hydrates the in-memory map from Storage. Must be called once before
    /// any `notify_*`. Idempotent: re-running just re-reads the current rows.
    pub async fn initialize(&self) -> PushResult<()> {
        for config in self.storage.load_all_webhook_configs().await? {
            self.configs.insert(config.task_id, config);
        }
        Ok(())
    }

    pub async fn register_push_config(
        &self,
        task_id: Uuid,
        config: WebhookConfig,
        persist: bool,
    ) -> PushResult<()> {
        if persist {
            self.storage.save_webhook_config(&config).await?;
        }
        self.configs.insert(task_id, config);
        Ok(())
    }

    pub async fn remove_push_config(&self, task_id: Uuid, delete_from_storage: bool) -> PushResult<()> {
        self.configs.remove(&task_id);
        if delete_from_storage {
            self.storage.delete_webhook_config(task_id).await?;
        }
        Ok(())
    }

    pub fn get_push_config(&self, task_id: Uuid) -> Option<WebhookConfig> {
        self.configs.get(&task_id).map(|entry| entry.clone())
    }

    pub fn get_global_webhook_config(&self) -> Option<WebhookConfig> {
        let url = self.global.url.clone()?;
        Some(WebhookConfig::new(Uuid::nil(), url, self.global.token.clone()))
    }

    pub fn get_effective_webhook_config(&self, task_id: Uuid) -> Option<WebhookConfig> {
        self.get_push_config(task_id)
            .or_else(|| self.get_global_webhook_config())
    }

    pub async fn notify_status(
        &self,
        task_id: Uuid,
        context_id: Uuid,
        state: TaskState,
        final_: bool,
    ) -> PushResult<()> {
        if !self.push_notifications_enabled {
            return Ok(());
        }
        let Some(config) = self.get_effective_webhook_config(task_id) else {
            return Ok(());
        };

        let sequence = self.sequencer.next(task_id);
        let event = PushEvent::status(task_id, context_id, sequence, state, final_);
        self.delivery.deliver(&config, &event, &self.circuit_breaker).await?;

        if final_ {
            // Terminal state: drop the persistent config, long-running
            // tasks keep theirs until they reach one.
            self.remove_push_config(task_id, true).await?;
            self.sequencer.reset(task_id);
        }
        Ok(())
    }

    pub async fn notify_artifact(&self, task_id: Uuid, context_id: Uuid, artifact: Artifact) -> PushResult<()> {
        if !self.push_notifications_enabled {
            return Ok(());
        }
        let Some(config) = self.get_effective_webhook_config(task_id) else {
            return Ok(());
        };

        let sequence = self.sequencer.next(task_id);
        let event = PushEvent::artifact(task_id, context_id, sequence, artifact);
        self.delivery.deliver(&config, &event, &self.circuit_breaker).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn manager(enabled: bool) -> PushNotificationManager {
        PushNotificationManager::new(
            Arc::new(Storage::Memory(MemoryStorage::new())),
            GlobalWebhookSettings { url: None, token: None },
            enabled,
        )
    }

    #[tokio::test]
    async fn notify_without_any_config_is_a_no_op() {
        let manager = manager(true);
        manager
            .notify_status(Uuid::new_v4(), Uuid::new_v4(), TaskState::Working, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn disabled_capability_is_a_no_op_even_with_config() {
        let manager = manager(false);
        let task_id = Uuid::new_v4();
        manager
            .register_push_config(
                task_id,
                WebhookConfig::new(task_id, "https://example.invalid/hook", None),
                false,
            )
            .await
            .unwrap();
        // Would attempt delivery (and fail against an invalid host) if
        // enabled; with the capability off it must short-circuit first.
        manager
            .notify_status(task_id, Uuid::new_v4(), TaskState::Completed, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn effective_config_prefers_per_task_over_global() {
        let mut manager = manager(true);
        manager.global = GlobalWebhookSettings {
            url: Some("https://global.example/hook".to_string()),
            token: None,
        };
        let task_id = Uuid::new_v4();
        assert_eq!(
            manager.get_effective_webhook_config(task_id).unwrap().url,
            "https://global.example/hook"
        );

        manager
            .register_push_config(
                task_id,
                WebhookConfig::new(task_id, "https://per-task.example/hook", None),
                false,
            )
            .await
            .unwrap();
        assert_eq!(
            manager.get_effective_webhook_config(task_id).unwrap().url,
            "https://per-task.example/hook"
        );
    }

    #[tokio::test]
    async fn remove_push_config_is_idempotent() {
        let manager = manager(true);
        let task_id = Uuid::new_v4();
        manager.remove_push_config(task_id, true).await.unwrap();
        manager.remove_push_config(task_id, true).await.unwrap();
    }
}
