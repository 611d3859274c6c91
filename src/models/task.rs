//! Task state machine data and the DAG of legal transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::Artifact;
use super::message::Message;

/// Lifecycle state of a task. Transitions form a DAG rooted at `Submitted`
/// with three terminal states; no transition escapes a terminal state
/// (enforced by [`TaskState::apply`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Paused,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Paused => "paused",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
        }
    }
}

/// A long-lived unit of agent work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub context_id: Uuid,
    pub state: TaskState,
    pub messages: Vec<Message>,
    pub artifacts: Vec<Artifact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(task_id: Uuid, context_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            context_id,
            state: TaskState::Submitted,
            messages: Vec::new(),
            artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and bump `updated_at`. Messages are immutable once
    /// appended (callers must not mutate history in place).
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Append an artifact and bump `updated_at`.
    pub fn push_artifact(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
        self.updated_at = Utc::now();
    }

    /// Apply a state transition if legal, returning the new state. Illegal
    /// transitions (including any transition out of a terminal state) are
    /// rejected without mutating `self`.
    pub fn transition(&mut self, to: TaskState) -> Result<TaskState, TransitionError> {
        if !is_legal_transition(self.state, to) {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.updated_at = Utc::now();
        Ok(self.state)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("illegal task transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: TaskState,
    pub to: TaskState,
}

/// Edges of the task state DAG.
pub fn is_legal_transition(from: TaskState, to: TaskState) -> bool {
    use TaskState::*;
    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (Submitted, Working)
            | (Working, InputRequired)
            | (Working, Paused)
            | (InputRequired, Paused)
            | (Paused, Working)
            | (Working, Canceled)
            | (Paused, Canceled)
            | (InputRequired, Canceled)
            | (Working, Completed)
            | (Working, Failed)
    )
}
