//! In-process storage backend: non-durable, used for tests and single
//! process demos.

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{Task, TaskState, WebhookConfig};

use super::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    tasks: DashMap<Uuid, Task>,
    webhook_configs: DashMap<Uuid, WebhookConfig>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_task(&self, task: Task) -> Result<(), StorageError> {
        self.tasks.insert(task.task_id, task);
        Ok(())
    }

    pub fn load_task(&self, task_id: Uuid) -> Result<Option<Task>, StorageError> {
        Ok(self.tasks.get(&task_id).map(|entry| entry.clone()))
    }

    pub fn update_task_state(&self, task_id: Uuid, to: TaskState) -> Result<Task, StorageError> {
        let mut entry = self
            .tasks
            .get_mut(&task_id)
            .ok_or(StorageError::TaskNotFound(task_id))?;
        entry.transition(to)?;
        Ok(entry.clone())
    }

    /// Removes the task and cascades to its webhook config, mirroring the
    /// `ON DELETE CASCADE` FK on the Postgres backend.
    pub fn delete_task(&self, task_id: Uuid) -> Result<(), StorageError> {
        self.tasks.remove(&task_id);
        self.webhook_configs.remove(&task_id);
        Ok(())
    }

    pub fn save_webhook_config(&self, config: WebhookConfig) -> Result<(), StorageError> {
        self.webhook_configs.insert(config.task_id, config);
        Ok(())
    }

    pub fn load_webhook_config(&self, task_id: Uuid) -> Result<Option<WebhookConfig>, StorageError> {
        Ok(self.webhook_configs.get(&task_id).map(|entry| entry.clone()))
    }

    pub fn delete_webhook_config(&self, task_id: Uuid) -> Result<(), StorageError> {
        self.webhook_configs.remove(&task_id);
        Ok(())
    }

    pub fn load_all_webhook_configs(&self) -> Result<Vec<WebhookConfig>, StorageError> {
        Ok(self.webhook_configs.iter().map(|entry| entry.clone()).collect())
    }
}
