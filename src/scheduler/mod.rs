//! The queue abstraction carrying typed `TaskOperation` values between
//! producers (request handlers) and consumers (the worker loop).
//!
//! Two backends, one enum, no trait objects: `Scheduler` dispatches to
//! `MemoryScheduler` or `RedisScheduler` by match.

pub mod config;
pub mod error;
pub mod memory;
pub mod redis;

pub use config::{RedisSchedulerConfig, RetryPolicy, SchedulerKind};
pub use error::SchedulerError;
pub use memory::MemoryScheduler;
pub use redis::RedisScheduler;

use uuid::Uuid;

use crate::models::{QueueEnvelope, TaskOperation, TaskSendParams};

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug)]
pub enum Scheduler {
    Memory(MemoryScheduler),
    Redis(RedisScheduler),
}

impl Scheduler {
    /// Acquire the scheduler resource: for Redis
    /// this establishes connectivity and pings; for memory it's infallible.
    pub async fn connect(kind: SchedulerKind) -> SchedulerResult<Self> {
        match kind {
            SchedulerKind::Memory { capacity } => Ok(Scheduler::Memory(MemoryScheduler::new(capacity))),
            SchedulerKind::Redis(config) => Ok(Scheduler::Redis(RedisScheduler::connect(config).await?)),
        }
    }

    pub async fn run_task(&self, params: TaskSendParams) -> SchedulerResult<()> {
        self.enqueue(QueueEnvelope::new(TaskOperation::Run(params))).await
    }

    pub async fn cancel_task(&self, task_id: Uuid) -> SchedulerResult<()> {
        self.enqueue(QueueEnvelope::new(TaskOperation::Cancel { task_id }))
            .await
    }

    pub async fn pause_task(&self, task_id: Uuid) -> SchedulerResult<()> {
        self.enqueue(QueueEnvelope::new(TaskOperation::Pause { task_id }))
            .await
    }

    pub async fn resume_task(&self, task_id: Uuid) -> SchedulerResult<()> {
        self.enqueue(QueueEnvelope::new(TaskOperation::Resume { task_id }))
            .await
    }

    async fn enqueue(&self, envelope: QueueEnvelope) -> SchedulerResult<()> {
        match self {
            Scheduler::Memory(m) => m.push(envelope).await,
            Scheduler::Redis(r) => r.push(envelope).await,
        }
    }

    /// One step of the lazy, infinite consumer sequence:
    /// `None` means the scheduler has been released and the caller should
    /// stop iterating.
    pub async fn receive_task_operations(&self) -> Option<QueueEnvelope> {
        match self {
            Scheduler::Memory(m) => m.recv().await,
            Scheduler::Redis(r) => r.recv().await,
        }
    }

    pub async fn get_queue_length(&self) -> SchedulerResult<u64> {
        match self {
            Scheduler::Memory(m) => Ok(m.queue_length().await as u64),
            Scheduler::Redis(r) => r.queue_length().await,
        }
    }

    pub async fn clear_queue(&self) -> SchedulerResult<u64> {
        match self {
            Scheduler::Memory(m) => Ok(m.clear().await as u64),
            Scheduler::Redis(r) => r.clear_queue().await,
        }
    }

    pub async fn health_check(&self) -> bool {
        match self {
            Scheduler::Memory(_) => true,
            Scheduler::Redis(r) => r.health_check().await,
        }
    }

    /// Release the scheduler resource: closes connections and causes any
    /// in-flight `receive_task_operations` iteration to terminate.
    pub async fn release(&self) {
        match self {
            Scheduler::Memory(m) => m.close().await,
            Scheduler::Redis(r) => r.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_scheduler_round_trips_run_operation() {
        let scheduler = Scheduler::connect(SchedulerKind::Memory { capacity: 8 })
            .await
            .unwrap();
        let params = TaskSendParams {
            task_id: Uuid::new_v4(),
            context_id: Uuid::new_v4(),
            messages: vec![],
            webhook: None,
            long_running: false,
        };
        let task_id = params.task_id;
        scheduler.run_task(params).await.unwrap();

        let envelope = scheduler.receive_task_operations().await.unwrap();
        assert_eq!(envelope.operation.kind(), "run");
        assert_eq!(envelope.operation.task_id(), task_id);
    }

    #[tokio::test]
    async fn release_terminates_pending_receive() {
        let scheduler = Scheduler::connect(SchedulerKind::Memory { capacity: 8 })
            .await
            .unwrap();
        scheduler.release().await;
        assert!(scheduler.receive_task_operations().await.is_none());
    }

    #[tokio::test]
    async fn queue_length_and_clear_reflect_buffered_operations() {
        let scheduler = Scheduler::connect(SchedulerKind::Memory { capacity: 8 })
            .await
            .unwrap();
        scheduler.cancel_task(Uuid::new_v4()).await.unwrap();
        scheduler.pause_task(Uuid::new_v4()).await.unwrap();
        assert_eq!(scheduler.get_queue_length().await.unwrap(), 2);
        assert_eq!(scheduler.clear_queue().await.unwrap(), 2);
        assert_eq!(scheduler.get_queue_length().await.unwrap(), 0);
    }
}
