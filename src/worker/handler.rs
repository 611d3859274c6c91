//! The handler invocation seam: out of scope for this runtime, but the
//! worker loop needs a trait to dispatch through.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::{Artifact, Message, Task};

#[derive(Debug)]
pub enum HandlerResult {
    /// The task needs another message before it can continue.
    NeedsInput,
    /// The handler has finished the task successfully.
    Completed,
    /// The handler failed; carries a human-readable reason for logging.
    Failed(String),
}

/// What a handler invocation produced for one `run` step: zero or more
/// artifacts (delivered before the step's status event) and a
/// terminal-or-continuing result.
#[derive(Debug)]
pub struct HandlerOutcome {
    pub artifacts: Vec<Artifact>,
    pub result: HandlerResult,
}

impl HandlerOutcome {
    pub fn needs_input() -> Self {
        Self {
            artifacts: Vec::new(),
            result: HandlerResult::NeedsInput,
        }
    }

    pub fn completed() -> Self {
        Self {
            artifacts: Vec::new(),
            result: HandlerResult::Completed,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            artifacts: Vec::new(),
            result: HandlerResult::Failed(reason.into()),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// Agent-specific business logic, invoked by the worker loop once per `run`
/// step. Implementations must respond to the cancellation token promptly
/// rather than running to completion regardless.
#[async_trait]
pub trait TaskHandler: Send + Sync + std::fmt::Debug {
    async fn handle(
        &self,
        task: &Task,
        new_messages: &[Message],
        cancellation: CancellationToken,
    ) -> HandlerOutcome;
}
