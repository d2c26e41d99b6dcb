//! Error types for the reactive engine.
//!
//! Failures fall into two groups:
//!
//! - Programmer errors, such as flushing from inside a flush. These are
//!   reported as [`FlushError::Reentrant`] and logged at error level; they are
//!   never retried.
//! - Failures of user code. A computation's callable that panics is caught at
//!   the `compute` boundary and turned into a [`ComputeError`] so the
//!   scheduler can decide, per its [`ErrorPolicy`](crate::ErrorPolicy),
//!   whether to abort the pass or keep going.

use std::any::Any;

use thiserror::Error;

use crate::reactive::ComputationId;

/// A computation's callable failed while running.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComputeError {
    /// The callable panicked. The payload is rendered to a string when it
    /// is a `&str` or `String`.
    #[error("computation {id} panicked: {message}")]
    Panicked { id: ComputationId, message: String },
}

impl ComputeError {
    pub(crate) fn from_panic(id: ComputationId, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { id, message }
    }

    /// The computation that failed.
    pub fn computation_id(&self) -> ComputationId {
        match self {
            Self::Panicked { id, .. } => *id,
        }
    }
}

/// Errors returned by [`Scheduler::flush`](crate::Scheduler::flush).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlushError {
    /// `flush` was called while a flush was already in progress.
    #[error("can't flush while in a flush")]
    Reentrant,

    /// A computation failed and the scheduler runs with
    /// [`ErrorPolicy::Propagate`](crate::ErrorPolicy::Propagate).
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// Errors raised while loading a [`SchedulerConfig`](crate::SchedulerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid scheduler config: {0}")]
    Json(#[from] serde_json::Error),
}
