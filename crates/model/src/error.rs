//! Model call errors and provider error classification.
//!
//! The provider reports auth, quota and transport failures with a mix of
//! status codes and free-text messages. [`classify_service_error`] is the one
//! place that turns those into a [`ServiceErrorKind`]; swap the rule table to
//! target a different provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    InvalidCredential,
    PermissionDenied,
    QuotaExceeded,
    Network,
    Other,
}

impl ServiceErrorKind {
    /// User-facing next step for this failure.
    pub fn guidance(&self) -> &'static str {
        match self {
            ServiceErrorKind::InvalidCredential => {
                "The Gemini API key was rejected. Check the key in Settings."
            }
            ServiceErrorKind::PermissionDenied => {
                "The API key does not have access to this model. Check the key's permissions."
            }
            ServiceErrorKind::QuotaExceeded => {
                "API quota exceeded. Wait a moment and try again, or check your plan limits."
            }
            ServiceErrorKind::Network => {
                "Could not reach the AI service. Check your connection and try again."
            }
            ServiceErrorKind::Other => "The AI service returned an error. Please try again.",
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceErrorKind::InvalidCredential => "invalid credential",
            ServiceErrorKind::PermissionDenied => "permission denied",
            ServiceErrorKind::QuotaExceeded => "quota exceeded",
            ServiceErrorKind::Network => "network error",
            ServiceErrorKind::Other => "service error",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    /// Neither the settings store nor the environment holds an API key
    #[error("Gemini API key is missing. Please set it in the Settings page.")]
    MissingCredential,

    /// Transport, auth or quota failure reported by the endpoint
    #[error("{kind}: {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    /// The endpoint answered but the payload was unusable
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Build a service error, classifying it from status and message.
    pub fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Service {
            kind: classify_service_error(status, &message),
            message,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn kind(&self) -> Option<ServiceErrorKind> {
        match self {
            ModelError::Service { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if err.is_connect() || err.is_timeout() {
            return ModelError::Service {
                kind: ServiceErrorKind::Network,
                message: err.to_string(),
            };
        }
        ModelError::service(status, err.to_string())
    }
}

/// Substring rules applied to the lowercased message, first match wins.
const MESSAGE_RULES: &[(&str, ServiceErrorKind)] = &[
    ("api key not valid", ServiceErrorKind::InvalidCredential),
    ("api_key_invalid", ServiceErrorKind::InvalidCredential),
    ("invalid api key", ServiceErrorKind::InvalidCredential),
    ("unauthenticated", ServiceErrorKind::InvalidCredential),
    ("401", ServiceErrorKind::InvalidCredential),
    ("permission_denied", ServiceErrorKind::PermissionDenied),
    ("permission denied", ServiceErrorKind::PermissionDenied),
    ("403", ServiceErrorKind::PermissionDenied),
    ("quota", ServiceErrorKind::QuotaExceeded),
    ("resource_exhausted", ServiceErrorKind::QuotaExceeded),
    ("rate limit", ServiceErrorKind::QuotaExceeded),
    ("429", ServiceErrorKind::QuotaExceeded),
    ("failed to fetch", ServiceErrorKind::Network),
    ("error sending request", ServiceErrorKind::Network),
    ("connection", ServiceErrorKind::Network),
    ("network", ServiceErrorKind::Network),
    ("timed out", ServiceErrorKind::Network),
    ("dns", ServiceErrorKind::Network),
];

pub fn classify_service_error(status: Option<u16>, message: &str) -> ServiceErrorKind {
    match status {
        Some(401) => return ServiceErrorKind::InvalidCredential,
        Some(403) => return ServiceErrorKind::PermissionDenied,
        Some(429) => return ServiceErrorKind::QuotaExceeded,
        _ => {}
    }

    let lowered = message.to_lowercase();
    MESSAGE_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(ServiceErrorKind::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_win() {
        assert_eq!(
            classify_service_error(Some(401), "whatever"),
            ServiceErrorKind::InvalidCredential
        );
        assert_eq!(
            classify_service_error(Some(403), ""),
            ServiceErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_service_error(Some(429), "slow down"),
            ServiceErrorKind::QuotaExceeded
        );
    }

    #[test]
    fn test_message_heuristics() {
        // Gemini reports a bad key as HTTP 400
        assert_eq!(
            classify_service_error(Some(400), "API key not valid. Please pass a valid API key."),
            ServiceErrorKind::InvalidCredential
        );
        assert_eq!(
            classify_service_error(None, "[429 Too Many Requests] You exceeded your current quota"),
            ServiceErrorKind::QuotaExceeded
        );
        assert_eq!(
            classify_service_error(Some(400), "RESOURCE_EXHAUSTED"),
            ServiceErrorKind::QuotaExceeded
        );
        assert_eq!(
            classify_service_error(None, "TypeError: Failed to fetch"),
            ServiceErrorKind::Network
        );
        assert_eq!(
            classify_service_error(Some(500), "internal"),
            ServiceErrorKind::Other
        );
    }

    #[test]
    fn test_service_error_display() {
        let err = ModelError::service(Some(429), "quota exhausted");
        assert_eq!(err.to_string(), "quota exceeded: quota exhausted");
        assert_eq!(err.kind(), Some(ServiceErrorKind::QuotaExceeded));
    }

    #[test]
    fn test_missing_credential_message() {
        assert!(ModelError::MissingCredential
            .to_string()
            .contains("Settings page"));
    }
}
