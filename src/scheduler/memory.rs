//! In-process bounded queue transport, single address space only.

use tokio::sync::{mpsc, Mutex};

use crate::models::QueueEnvelope;

use super::error::SchedulerError;

#[derive(Debug)]
pub struct MemoryScheduler {
    sender: Mutex<Option<mpsc::Sender<QueueEnvelope>>>,
    receiver: Mutex<mpsc::Receiver<QueueEnvelope>>,
    capacity: usize,
}

impl MemoryScheduler {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            capacity,
        }
    }

    pub async fn push(&self, envelope: QueueEnvelope) -> Result<(), SchedulerError> {
        let guard = self.sender.lock().await;
        match guard.as_ref() {
            Some(sender) => sender
                .send(envelope)
                .await
                .map_err(|_| SchedulerError::Closed),
            None => Err(SchedulerError::Closed),
        }
    }

    /// Blocks until the next operation is available, or returns `None` once
    /// the queue has been closed (the memory-transport equivalent of a
    /// shutdown sentinel: dropping the sender lets buffered operations drain
    /// before `recv` reports the channel closed).
    pub async fn recv(&self) -> Option<QueueEnvelope> {
        self.receiver.lock().await.recv().await
    }

    /// Best-effort: the number of operations currently buffered.
    pub async fn queue_length(&self) -> usize {
        match self.sender.lock().await.as_ref() {
            Some(sender) => self.capacity.saturating_sub(sender.capacity()),
            None => 0,
        }
    }

    /// Drains all buffered operations, returning the count removed.
    pub async fn clear(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        let mut count = 0;
        while receiver.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Drops the sender side, causing any in-flight `recv` to unblock with
    /// `None` once buffered operations are drained.
    pub async fn close(&self) {
        self.sender.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskOperation, TaskSendParams};
    use uuid::Uuid;

    fn envelope() -> QueueEnvelope {
        let params = TaskSendParams {
            task_id: Uuid::new_v4(),
            context_id: Uuid::new_v4(),
            messages: Vec::new(),
            webhook: None,
            long_running: false,
        };
        QueueEnvelope::new(TaskOperation::Run(params))
    }

    #[tokio::test]
    async fn push_then_recv_preserves_operation() {
        let scheduler = MemoryScheduler::new(4);
        let env = envelope();
        let task_id = env.operation.task_id();
        scheduler.push(env).await.unwrap();
        let received = scheduler.recv().await.unwrap();
        assert_eq!(received.operation.task_id(), task_id);
    }

    #[tokio::test]
    async fn clear_drains_buffered_operations() {
        let scheduler = MemoryScheduler::new(4);
        scheduler.push(envelope()).await.unwrap();
        scheduler.push(envelope()).await.unwrap();
        assert_eq!(scheduler.clear().await, 2);
        assert_eq!(scheduler.queue_length().await, 0);
    }

    #[tokio::test]
    async fn close_unblocks_pending_recv() {
        let scheduler = MemoryScheduler::new(4);
        scheduler.close().await;
        assert!(scheduler.recv().await.is_none());
        assert!(matches!(
            scheduler.push(envelope()).await,
            Err(SchedulerError::Closed)
        ));
    }
}
