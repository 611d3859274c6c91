//! Storage error taxonomy.

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error("illegal state transition: {0}")]
    IllegalTransition(#[from] crate::models::TransitionError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
