//! Worker loop: reads operations from the Scheduler, loads
//! task state from Storage, invokes the handler, publishes state+artifact
//! events through the Push Manager, writes results back to Storage.

pub mod handler;

pub use handler::{HandlerOutcome, HandlerResult, TaskHandler};

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{QueueEnvelope, Task, TaskOperation, TaskState};
use crate::push::PushNotificationManager;
use crate::scheduler::Scheduler;
use crate::storage::Storage;

#[derive(Debug)]
pub struct Worker {
    scheduler: Arc<Scheduler>,
    storage: Arc<Storage>,
    push_manager: Arc<PushNotificationManager>,
    handler: Arc<dyn TaskHandler>,
    /// Cancellation tokens for tasks currently in flight, keyed by task_id.
    cancellations: DashMap<Uuid, CancellationToken>,
}

impl Worker {
    pub fn new(
        scheduler: Arc<Scheduler>,
        storage: Arc<Storage>,
        push_manager: Arc<PushNotificationManager>,
        handler: Arc<dyn TaskHandler>,
    ) -> Self {
        Self {
            scheduler,
            storage,
            push_manager,
            handler,
            cancellations: DashMap::new(),
        }
    }

    /// Runs until the scheduler is released or
    /// `shutdown` fires, whichever comes first.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("worker loop starting");
        loop {
            let next = tokio::select! {
                envelope = self.scheduler.receive_task_operations() => envelope,
                _ = shutdown.cancelled() => {
                    info!("worker loop shutting down on signal");
                    return;
                }
            };

            let Some(envelope) = next else {
                info!("scheduler released, worker loop exiting");
                return;
            };

            self.dispatch(envelope).await;
        }
    }

    async fn dispatch(&self, envelope: QueueEnvelope) {
        let task_id = envelope.operation.task_id();
        match envelope.operation {
            TaskOperation::Run(params) => {
                let messages = params.messages;
                if let Some(webhook) = params.webhook.clone() {
                    if let Err(e) = self
                        .push_manager
                        .register_push_config(task_id, webhook, params.long_running)
                        .await
                    {
                        warn!(%task_id, error = %e, "failed to register per-task webhook config");
                    }
                }
                match self.storage.load_task(task_id).await {
                    Ok(existing) => {
                        let mut task = existing.unwrap_or_else(|| Task::new(task_id, params.context_id));
                        for message in &messages {
                            task.push_message(message.clone());
                        }
                        self.handle_run(task, messages).await;
                    }
                    Err(e) => warn!(%task_id, error = %e, "failed to load task for run operation"),
                }
            }
            TaskOperation::Cancel { task_id } => self.handle_cancel(task_id).await,
            TaskOperation::Pause { task_id } => self.handle_pause(task_id).await,
            TaskOperation::Resume { task_id } => self.handle_resume(task_id).await,
        }
    }

    async fn handle_run(&self, mut task: Task, new_messages: Vec<crate::models::Message>) {
        let task_id = task.task_id;
        let context_id = task.context_id;

        if task.state == TaskState::Submitted {
            if let Err(e) = task.transition(TaskState::Working) {
                warn!(%task_id, error = %e, "cannot start run");
                return;
            }
        } else if task.state == TaskState::InputRequired {
            if let Err(e) = task.transition(TaskState::Working) {
                warn!(%task_id, error = %e, "cannot resume run with new input");
                return;
            }
        } else if task.state.is_terminal() {
            debug!(%task_id, state = task.state.as_str(), "run on terminal task ignored");
            return;
        }

        if let Err(e) = self.persist_and_notify(&task).await {
            warn!(%task_id, error = %e, "failed to persist working state");
            return;
        }

        let cancellation = CancellationToken::new();
        self.cancellations.insert(task_id, cancellation.clone());

        let outcome = self.handler.handle(&task, &new_messages, cancellation).await;
        self.cancellations.remove(&task_id);

        for artifact in outcome.artifacts {
            task.push_artifact(artifact.clone());
            if let Err(e) = self.push_manager.notify_artifact(task_id, context_id, artifact).await {
                warn!(%task_id, error = %e, "failed to notify artifact");
            }
        }

        let next_state = match outcome.result {
            HandlerResult::NeedsInput => TaskState::InputRequired,
            HandlerResult::Completed => TaskState::Completed,
            HandlerResult::Failed(reason) => {
                warn!(%task_id, reason, "handler failed");
                TaskState::Failed
            }
        };

        if let Err(e) = task.transition(next_state) {
            warn!(%task_id, error = %e, "illegal post-handler transition");
            return;
        }
        if let Err(e) = self.persist_and_notify(&task).await {
            warn!(%task_id, error = %e, "failed to persist post-handler state");
        }
    }

    async fn handle_cancel(&self, task_id: Uuid) {
        let Some(mut task) = self.load_known_task(task_id, "cancel").await else {
            return;
        };
        if task.state.is_terminal() {
            debug!(%task_id, "cancel on terminal task is a no-op");
            return;
        }
        if let Some((_, token)) = self.cancellations.remove(&task_id) {
            token.cancel();
        }
        if task.transition(TaskState::Canceled).is_ok() {
            if let Err(e) = self.persist_and_notify(&task).await {
                warn!(%task_id, error = %e, "failed to persist canceled state");
            }
        }
    }

    async fn handle_pause(&self, task_id: Uuid) {
        let Some(mut task) = self.load_known_task(task_id, "pause").await else {
            return;
        };
        if task.state.is_terminal() {
            debug!(%task_id, "pause on terminal task is a no-op");
            return;
        }
        if task.state == TaskState::Paused {
            debug!(%task_id, "pause on already-paused task is a no-op");
            return;
        }
        if task.transition(TaskState::Paused).is_ok() {
            if let Err(e) = self.persist_and_notify(&task).await {
                warn!(%task_id, error = %e, "failed to persist paused state");
            }
        }
    }

    async fn handle_resume(&self, task_id: Uuid) {
        let Some(mut task) = self.load_known_task(task_id, "resume").await else {
            return;
        };
        if task.state != TaskState::Paused {
            debug!(%task_id, state = task.state.as_str(), "resume on non-paused task is a no-op");
            return;
        }
        if task.transition(TaskState::Working).is_ok() {
            if let Err(e) = self.persist_and_notify(&task).await {
                warn!(%task_id, error = %e, "failed to persist resumed state");
            }
        }
    }

    async fn load_known_task(&self, task_id: Uuid, op: &str) -> Option<Task> {
        match self.storage.load_task(task_id).await {
            Ok(Some(task)) => Some(task),
            Ok(None) => {
                debug!(%task_id, op, "operation targets unknown task, discarding");
                None
            }
            Err(e) => {
                warn!(%task_id, op, error = %e, "failed to load task");
                None
            }
        }
    }

    async fn persist_and_notify(&self, task: &Task) -> Result<(), crate::error::RuntimeError> {
        self.storage.save_task(task).await?;
        self.push_manager
            .notify_status(task.task_id, task.context_id, task.state, task.state.is_terminal())
            .await?;
        Ok(())
    }
}
