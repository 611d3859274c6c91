//! Top-level error taxonomy.
//!
//! Each component owns a focused error enum (`SchedulerError`, `PushError`,
//! `StorageError`); this module aggregates them behind one `RuntimeError` for
//! callers that cross component boundaries (the worker loop, the server
//! binary). Component errors convert into `RuntimeError` via `From`.

use crate::push::PushError;
use crate::scheduler::SchedulerError;
use crate::storage::StorageError;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Push(#[from] PushError),

    #[error("unknown task_id {0}")]
    UnknownTask(uuid::Uuid),
}
