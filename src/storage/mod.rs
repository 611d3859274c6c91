//! Durable home of tasks, messages, artifacts, and webhook configs.
//! Two backends, one enum, no trait objects.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

use uuid::Uuid;

use crate::models::{Task, TaskState, WebhookConfig};

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum Storage {
    Memory(MemoryStorage),
    Postgres(PostgresStorage),
}

impl Storage {
    pub async fn save_task(&self, task: &Task) -> StorageResult<()> {
        match self {
            Storage::Memory(m) => m.save_task(task.clone()),
            Storage::Postgres(p) => p.save_task(task).await,
        }
    }

    pub async fn load_task(&self, task_id: Uuid) -> StorageResult<Option<Task>> {
        match self {
            Storage::Memory(m) => m.load_task(task_id),
            Storage::Postgres(p) => p.load_task(task_id).await,
        }
    }

    pub async fn update_task_state(&self, task_id: Uuid, to: TaskState) -> StorageResult<Task> {
        match self {
            Storage::Memory(m) => m.update_task_state(task_id, to),
            Storage::Postgres(p) => p.update_task_state(task_id, to).await,
        }
    }

    /// Removes a task and cascades to its webhook config on both backends.
    pub async fn delete_task(&self, task_id: Uuid) -> StorageResult<()> {
        match self {
            Storage::Memory(m) => m.delete_task(task_id),
            Storage::Postgres(p) => p.delete_task(task_id).await,
        }
    }

    pub async fn save_webhook_config(&self, config: &WebhookConfig) -> StorageResult<()> {
        match self {
            Storage::Memory(m) => m.save_webhook_config(config.clone()),
            Storage::Postgres(p) => p.save_webhook_config(config).await,
        }
    }

    pub async fn load_webhook_config(&self, task_id: Uuid) -> StorageResult<Option<WebhookConfig>> {
        match self {
            Storage::Memory(m) => m.load_webhook_config(task_id),
            Storage::Postgres(p) => p.load_webhook_config(task_id).await,
        }
    }

    pub async fn delete_webhook_config(&self, task_id: Uuid) -> StorageResult<()> {
        match self {
            Storage::Memory(m) => m.delete_webhook_config(task_id),
            Storage::Postgres(p) => p.delete_webhook_config(task_id).await,
        }
    }

    pub async fn load_all_webhook_configs(&self) -> StorageResult<Vec<WebhookConfig>> {
        match self {
            Storage::Memory(m) => m.load_all_webhook_configs(),
            Storage::Postgres(p) => p.load_all_webhook_configs().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[tokio::test]
    async fn memory_backend_round_trips_through_storage_enum() {
        let storage = Storage::Memory(MemoryStorage::new());
        let task = Task::new(Uuid::new_v4(), Uuid::new_v4());
        let task_id = task.task_id;
        storage.save_task(&task).await.unwrap();
        let loaded = storage.load_task(task_id).await.unwrap().unwrap();
        assert_eq!(loaded.task_id, task_id);
    }

    #[tokio::test]
    async fn delete_task_cascades_webhook_config_through_storage_enum() {
        let storage = Storage::Memory(MemoryStorage::new());
        let task = Task::new(Uuid::new_v4(), Uuid::new_v4());
        let task_id = task.task_id;
        storage.save_task(&task).await.unwrap();
        storage
            .save_webhook_config(&WebhookConfig::new(task_id, "https://example.com/hook", None))
            .await
            .unwrap();

        storage.delete_task(task_id).await.unwrap();

        assert!(storage.load_task(task_id).await.unwrap().is_none());
        assert!(storage.load_webhook_config(task_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_all_webhook_configs_reflects_saved_entries() {
        let storage = Storage::Memory(MemoryStorage::new());
        let task_id = Uuid::new_v4();
        storage
            .save_webhook_config(&WebhookConfig::new(task_id, "https://example.com/hook", None))
            .await
            .unwrap();
        let all = storage.load_all_webhook_configs().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].task_id, task_id);
    }
}
