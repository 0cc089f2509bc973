use thiserror::Error;

use crate::failure::FailureInfo;
use crate::state::Phase;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("No analysis is ready (current phase: {0})")]
    NotReady(Phase),

    #[error("A memo is already being generated")]
    MemoInFlight,

    #[error("Message is empty")]
    EmptyMessage,

    /// A newer upload replaced the session while this call was in flight
    #[error("The analysis session was replaced by a newer upload")]
    Superseded,

    #[error("Failed to generate memo: {}", .0.message)]
    Memo(FailureInfo),

    #[error("Background task stopped unexpectedly: {0}")]
    Interrupted(String),
}
