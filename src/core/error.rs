//! Error types for scheduler construction and task execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::TaskId;

/// Errors produced while constructing scheduler components.
///
/// These are surfaced synchronously to the caller of the constructor and are
/// fatal to that construction call only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Configuration validation failed (non-positive limit, zero backoff, parse error).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A task was built without a work callable.
    #[error("task {id} has no work attached")]
    MissingWork {
        /// Identifier of the rejected task.
        id: TaskId,
    },
}

/// Failure outcome of a single task execution.
///
/// Recovered at the task boundary; never propagated to sibling tasks or to
/// the drain loop.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum TaskError {
    /// The work callable returned an error.
    #[error("task failed: {0}")]
    Failed(String),
    /// The work callable panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// The failure reason without the variant prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Failed(reason) | Self::Panicked(reason) => reason,
        }
    }

    /// Whether the failure came from a panic rather than a returned error.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
