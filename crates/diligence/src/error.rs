use model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiligenceError {
    #[error("Failed to detect red flags: {0}")]
    Model(#[from] ModelError),

    /// The model kept requesting tool calls past the round cap
    #[error("Claim verification did not finish within {rounds} tool-call rounds")]
    VerificationLoopExceeded { rounds: usize },

    #[error("Claim verifier failed: {0}")]
    Verifier(String),
}
