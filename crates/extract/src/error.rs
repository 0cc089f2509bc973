use model::{ModelError, ServiceErrorKind};
use thiserror::Error;

/// Fatal errors of the primary analysis call.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Gemini API key is missing. Please set it in the Settings page.")]
    MissingCredential,

    #[error("Failed to analyze pitch deck ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("Failed to parse pitch deck analysis: {0}")]
    Parse(String),
}

impl From<ModelError> for AnalysisError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MissingCredential => AnalysisError::MissingCredential,
            ModelError::Service { kind, message } => AnalysisError::Service { kind, message },
            // A 200 with no usable candidate is a response-shape problem
            ModelError::MalformedResponse(message) => AnalysisError::Parse(message),
        }
    }
}
