use thiserror::Error;

use crate::api::ApiError;
use crate::pipeline::{CommitReport, RoundCommand, RoundState, RoundTemplateId};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(
        "Partial failure: {} of {} updates succeeded",
        .0.succeeded.len(),
        .0.submitted
    )]
    PartialFailure(CommitReport),

    #[error("No round follows template {0}")]
    NoNextRound(RoundTemplateId),

    #[error("Round template {0} is locked; progress into it first")]
    RoundLocked(RoundTemplateId),

    #[error("Cannot {command} a round in state {state}")]
    InvalidTransition {
        state: RoundState,
        command: RoundCommand,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(#[source] ApiError),
}

impl From<ApiError> for PipelineError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { resource } => PipelineError::NotFound(resource),
            other => PipelineError::Transport(other),
        }
    }
}

impl PipelineError {
    /// Whether re-invoking the failed operation may succeed.
    ///
    /// Transport failures are retryable because every step they can interrupt
    /// (confirm, upsert) is idempotent on the server.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Transport(_) | PipelineError::PartialFailure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_maps_to_not_found() {
        let err: PipelineError = ApiError::NotFound {
            resource: "round template rt-9".into(),
        }
        .into();
        assert!(matches!(err, PipelineError::NotFound(ref r) if r == "round template rt-9"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn other_api_errors_are_transport() {
        let err: PipelineError = ApiError::Status {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert!(matches!(err, PipelineError::Transport(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn no_next_round_display() {
        let err = PipelineError::NoNextRound(RoundTemplateId::from("rt-4"));
        assert_eq!(err.to_string(), "No round follows template rt-4");
    }

    #[test]
    fn invalid_transition_display() {
        let err = PipelineError::InvalidTransition {
            state: RoundState::Locked,
            command: RoundCommand::Confirm,
        };
        assert_eq!(err.to_string(), "Cannot confirm a round in state LOCKED");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
    }
}
