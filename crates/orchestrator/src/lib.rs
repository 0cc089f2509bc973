pub mod error;
pub mod failure;
pub mod orchestrator;
pub mod state;

pub use error::OrchestratorError;
pub use failure::{FailureInfo, FailureKind};
pub use orchestrator::{AttemptOutcome, Orchestrator};
pub use state::{Phase, SessionSnapshot};
