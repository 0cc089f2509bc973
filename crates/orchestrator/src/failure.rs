use serde::{Deserialize, Serialize};

use extract::AnalysisError;
use ingest::DeckError;
use model::{ModelError, ServiceErrorKind};

/// Coarse failure category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidDeck,
    MissingCredential,
    InvalidCredential,
    PermissionDenied,
    QuotaExceeded,
    Network,
    Parse,
    Service,
}

impl From<ServiceErrorKind> for FailureKind {
    fn from(kind: ServiceErrorKind) -> Self {
        match kind {
            ServiceErrorKind::InvalidCredential => FailureKind::InvalidCredential,
            ServiceErrorKind::PermissionDenied => FailureKind::PermissionDenied,
            ServiceErrorKind::QuotaExceeded => FailureKind::QuotaExceeded,
            ServiceErrorKind::Network => FailureKind::Network,
            ServiceErrorKind::Other => FailureKind::Service,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
    pub guidance: String,
}

const MISSING_CREDENTIAL_GUIDANCE: &str =
    "Add your Gemini API key in Settings, then upload the deck again.";
const PARSE_GUIDANCE: &str =
    "The AI response could not be read as an analysis. Upload the deck again to retry.";
const INVALID_DECK_GUIDANCE: &str = "Upload a PDF pitch deck no larger than 20 MB.";

impl FailureInfo {
    fn new(kind: FailureKind, message: String, guidance: &str) -> Self {
        Self {
            kind,
            message,
            guidance: guidance.to_string(),
        }
    }
}

impl From<&AnalysisError> for FailureInfo {
    fn from(err: &AnalysisError) -> Self {
        let message = err.to_string();
        match err {
            AnalysisError::MissingCredential => Self::new(
                FailureKind::MissingCredential,
                message,
                MISSING_CREDENTIAL_GUIDANCE,
            ),
            AnalysisError::Service { kind, .. } => {
                Self::new((*kind).into(), message, kind.guidance())
            }
            AnalysisError::Parse(_) => Self::new(FailureKind::Parse, message, PARSE_GUIDANCE),
        }
    }
}

impl From<&ModelError> for FailureInfo {
    fn from(err: &ModelError) -> Self {
        let message = err.to_string();
        match err {
            ModelError::MissingCredential => Self::new(
                FailureKind::MissingCredential,
                message,
                MISSING_CREDENTIAL_GUIDANCE,
            ),
            ModelError::Service { kind, .. } => Self::new((*kind).into(), message, kind.guidance()),
            ModelError::MalformedResponse(_) => Self::new(
                FailureKind::Parse,
                message,
                "The AI response was empty or blocked. Please try again.",
            ),
        }
    }
}

impl From<&DeckError> for FailureInfo {
    fn from(err: &DeckError) -> Self {
        Self::new(FailureKind::InvalidDeck, err.to_string(), INVALID_DECK_GUIDANCE)
    }
}
