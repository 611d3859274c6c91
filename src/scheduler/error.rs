//! Scheduler error taxonomy.

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("failed to connect to scheduler transport: {0}")]
    Connection(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to serialize task operation: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("scheduler shut down")]
    Closed,
}
