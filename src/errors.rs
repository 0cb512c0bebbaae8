//! Error types for the probe pool
//!
//! Two families:
//! - `PoolError` covers construction and lifecycle misuse; it is the only
//!   error a caller ever sees as `Err` from the pool API.
//! - `ProbeError` is a per-target failure. It never aborts the pool, it is
//!   carried inside a `ProbeOutcome` through the result channel.

use std::time::Duration;
use thiserror::Error;

use crate::model::PoolState;

/// Pool construction and lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A configuration value is out of range
    #[error("Invalid configuration '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// An environment variable could not be parsed
    #[error("Invalid environment variable '{var}': {reason}")]
    Env { var: &'static str, reason: String },

    /// `run` was called on a pool that has already left `Idle`
    #[error("Pool already started (state: {state:?}); build a fresh pool for a new run")]
    AlreadyStarted { state: PoolState },

    /// The work queue no longer accepts targets
    #[error("Work queue is closed")]
    QueueClosed,

    /// Non-blocking enqueue found the work queue at capacity
    #[error("Work queue is full")]
    QueueFull,
}

/// Failure of a single target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe did not finish before its deadline
    #[error("timeout after {after:?}")]
    Timeout { after: Duration },

    /// The probe ran and reported a failure (bad target, refused connection, ...)
    #[error("{0}")]
    Invocation(String),

    /// The target never reached a worker: the queue was full in non-blocking mode
    #[error("rejected: work queue full")]
    Rejected,

    /// The pool was stopped before this target was probed
    #[error("cancelled")]
    Cancelled,

    /// The probe panicked
    #[error("probe panicked: {0}")]
    Panicked(String),
}

impl ProbeError {
    pub fn invocation(reason: impl std::fmt::Display) -> Self {
        ProbeError::Invocation(reason.to_string())
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
    }
}

/// Result type alias for PoolError
pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reason_mentions_timeout() {
        let err = ProbeError::Timeout {
            after: Duration::from_millis(300),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("timeout"));
    }

    #[test]
    fn test_invocation_keeps_detail() {
        let err = ProbeError::invocation("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_already_started_names_state() {
        let err = PoolError::AlreadyStarted {
            state: PoolState::Closed,
        };
        assert!(err.to_string().contains("Closed"));
    }
}
