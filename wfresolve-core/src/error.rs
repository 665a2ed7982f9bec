//! Core error types.

use crate::catalog::{StateId, TransitionId, WorkflowId};
use thiserror::Error;

/// Errors from the catalog loader and transition resolver.
///
/// "Nothing matched" is never an error: unknown workflows, unknown states and
/// unresolvable transitions are reported as negative results instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("acceptance filter must contain at least one token")]
    EmptyAcceptTokens,

    #[error("malformed {kind} record #{index}: {reason}")]
    MalformedRecord {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    #[error("duplicate state {state} in workflow {workflow}")]
    DuplicateState { workflow: WorkflowId, state: StateId },

    #[error("duplicate transition {transition} in workflow {workflow}")]
    DuplicateTransition {
        workflow: WorkflowId,
        transition: TransitionId,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns true if the error was caused by the caller rather than by data.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidArgument { .. } | CoreError::EmptyAcceptTokens
        )
    }

    /// Returns a stable error code suitable for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            CoreError::EmptyAcceptTokens => "INVALID_ARGUMENT",
            CoreError::MalformedRecord { .. } => "MALFORMED_RECORD",
            CoreError::DuplicateState { .. } => "DUPLICATE_STATE",
            CoreError::DuplicateTransition { .. } => "DUPLICATE_TRANSITION",
            CoreError::Json(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::EmptyAcceptTokens.error_code(), "INVALID_ARGUMENT");
        assert_eq!(
            CoreError::DuplicateState {
                workflow: WorkflowId(1),
                state: StateId(10),
            }
            .error_code(),
            "DUPLICATE_STATE"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(CoreError::EmptyAcceptTokens.is_caller_error());
        assert!(CoreError::InvalidArgument {
            reason: "bad".to_string()
        }
        .is_caller_error());
        assert!(!CoreError::MalformedRecord {
            kind: "state",
            index: 0,
            reason: "missing state_id".to_string(),
        }
        .is_caller_error());
    }

    #[test]
    fn test_display() {
        let err = CoreError::DuplicateTransition {
            workflow: WorkflowId(1),
            transition: TransitionId(100),
        };
        assert_eq!(err.to_string(), "duplicate transition 100 in workflow 1");
    }
}
