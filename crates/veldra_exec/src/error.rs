//! # Scheduler Error Types
//!
//! Two families: misuse errors surfaced synchronously to the caller
//! ([`SchedulerError`]) and per-task failures collected into the frame
//! report ([`TaskError`] / [`TaskFailure`]). Nothing is silently swallowed;
//! every failure is at least logged once.

use thiserror::Error;

use veldra_core::EntityId;

use crate::task::{Task, TaskKind};

/// Synchronous errors from scheduler operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `submit` was called after the frame's queue was sealed.
    #[error("task queue sealed for frame {frame}; submissions reopen at begin_frame")]
    QueueSealed {
        /// The frame whose queue rejected the submission.
        frame: u64,
    },

    /// The submitted task's kind has no registered executor.
    #[error("no executor registered for task kind {0:?}")]
    NoExecutor(TaskKind),
}

/// A single task's failure, reported by its executor or caught by the pool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    /// The payload entity was stale or despawned.
    #[error("payload entity {0:?} is stale or despawned")]
    StalePayload(EntityId),

    /// The task body panicked; the panic was caught at the task boundary.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// Domain-specific failure.
    #[error("task failed: {0}")]
    Failed(String),
}

/// A failed task together with its error, as recorded in the frame report.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    /// The task that failed.
    pub task: Task,
    /// Why it failed.
    pub error: TaskError,
}
