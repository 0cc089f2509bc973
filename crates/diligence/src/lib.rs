pub mod competitors;
pub mod error;
pub mod prompt;
pub mod red_flags;
pub mod verifier;

pub use competitors::CompetitorResearcher;
pub use error::DiligenceError;
pub use red_flags::{DEFAULT_MAX_ROUNDS, RedFlag, RedFlagDetector, RedFlagReport};
pub use verifier::{ClaimVerifier, SimulatedVerifier, VerificationOutcome};
