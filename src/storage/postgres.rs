//! Relational storage backend: one table per entity, backed
//! by Postgres through `sqlx`.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Artifact, Message, Task, TaskState, WebhookConfig};

use super::error::StorageError;

/// Embeds `migrations/` at compile time; used both by `PostgresStorage::connect`
/// and by `#[sqlx::test(migrator = "crate::storage::postgres::MIGRATOR")]` in
/// integration tests gated behind the `test-db` feature.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        MIGRATOR.run(&pool).await.map_err(|e| {
            StorageError::Database(sqlx::Error::Migrate(Box::new(e)))
        })?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save_task(&self, task: &Task) -> Result<(), StorageError> {
        let messages = serde_json::to_value(&task.messages)?;
        let artifacts = serde_json::to_value(&task.artifacts)?;
        sqlx::query(
            r#"
            INSERT INTO tasks (id, context_id, state, messages, artifacts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                state = EXCLUDED.state,
                messages = EXCLUDED.messages,
                artifacts = EXCLUDED.artifacts,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(task.task_id)
        .bind(task.context_id)
        .bind(task.state.as_str())
        .bind(messages)
        .bind(artifacts)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_task(&self, task_id: Uuid) -> Result<Option<Task>, StorageError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT id, context_id, state, messages, artifacts, created_at, updated_at FROM tasks WHERE id = $1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskRow::into_task).transpose()
    }

    /// Guarded by the state-machine DAG: loads the current row, validates
    /// the transition in memory, then writes the result back. Good enough
    /// for single-writer-per-task_id dispatch; a compare-and-set
    /// on `state` would be needed for unrouted concurrent writers.
    pub async fn update_task_state(&self, task_id: Uuid, to: TaskState) -> Result<Task, StorageError> {
        let mut task = self
            .load_task(task_id)
            .await?
            .ok_or(StorageError::TaskNotFound(task_id))?;
        task.transition(to)?;
        self.save_task(&task).await?;
        Ok(task)
    }

    /// Relies on the `webhook_configs.task_id` FK's `ON DELETE CASCADE` to
    /// remove any associated webhook config in the same statement.
    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn save_webhook_config(&self, config: &WebhookConfig) -> Result<(), StorageError> {
        let validator = config
            .validator
            .clone()
            .unwrap_or(serde_json::Value::Null);
        let body = serde_json::json!({
            "url": config.url,
            "token": config.token,
            "validator": validator,
        });
        sqlx::query(
            r#"
            INSERT INTO webhook_configs (task_id, config, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (task_id) DO UPDATE SET
                config = EXCLUDED.config,
                updated_at = NOW()
            "#,
        )
        .bind(config.task_id)
        .bind(&body)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_webhook_config(&self, task_id: Uuid) -> Result<Option<WebhookConfig>, StorageError> {
        let row = sqlx::query_as::<_, WebhookRow>(
            "SELECT task_id, config, created_at, updated_at FROM webhook_configs WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(WebhookRow::into_config).transpose()
    }

    pub async fn delete_webhook_config(&self, task_id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM webhook_configs WHERE task_id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn load_all_webhook_configs(&self) -> Result<Vec<WebhookConfig>, StorageError> {
        let rows = sqlx::query_as::<_, WebhookRow>(
            "SELECT task_id, config, created_at, updated_at FROM webhook_configs ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(WebhookRow::into_config).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    context_id: Uuid,
    state: String,
    messages: serde_json::Value,
    artifacts: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, StorageError> {
        let state = match self.state.as_str() {
            "submitted" => TaskState::Submitted,
            "working" => TaskState::Working,
            "input-required" => TaskState::InputRequired,
            "paused" => TaskState::Paused,
            "completed" => TaskState::Completed,
            "failed" => TaskState::Failed,
            "canceled" => TaskState::Canceled,
            other => {
                return Err(StorageError::Database(sqlx::Error::Decode(
                    format!("unknown task state {other:?}").into(),
                )))
            }
        };
        let messages: Vec<Message> = serde_json::from_value(self.messages)?;
        let artifacts: Vec<Artifact> = serde_json::from_value(self.artifacts)?;
        Ok(Task {
            task_id: self.id,
            context_id: self.context_id,
            state,
            messages,
            artifacts,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WebhookRow {
    task_id: Uuid,
    config: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl WebhookRow {
    fn into_config(self) -> Result<WebhookConfig, StorageError> {
        let url = self.config["url"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let token = self.config["token"].as_str().map(|s| s.to_string());
        let validator = self.config.get("validator").cloned().filter(|v| !v.is_null());
        Ok(WebhookConfig {
            task_id: self.task_id,
            url,
            token,
            validator,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
