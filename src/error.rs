//! Error taxonomy for the generator.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum FluxError {
    /// Required configuration (the provider credential) is absent.
    #[error("Configuration error: {0}")]
    ConfigurationMissing(String),

    /// The submitted form cannot be dispatched as-is.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider answered, but with a failure.
    #[error("Replicate API error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The prediction ran and ended as `failed` or `canceled`.
    #[error("Replicate prediction {id} did not succeed: {message}")]
    PredictionFailed { id: String, message: String },

    /// The provider or the image host could not be reached, or answered non-2xx
    /// while fetching bytes.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The prediction succeeded but no image location could be extracted.
    #[error("Replicate did not return a valid image URL in an expected format")]
    UnrecognizedResponse(Value),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FluxError {
    /// Label shown next to the message in the UI.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "ConfigurationMissing",
            Self::InvalidInput(_) => "UserInputInvalid",
            Self::Provider { .. } | Self::PredictionFailed { .. } => "ProviderError",
            Self::Network(_) => "NetworkError",
            Self::UnrecognizedResponse(_) => "ResponseShapeUnrecognized",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
            Self::Template(_) => "TemplateError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Only a missing credential ends the session; everything else leaves the
    /// form usable for another submission.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigurationMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, FluxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_categories() {
        assert_eq!(
            FluxError::InvalidInput("empty".into()).category(),
            "UserInputInvalid"
        );
        assert_eq!(
            FluxError::Provider {
                status: 401,
                message: "Unauthenticated".into()
            }
            .category(),
            "ProviderError"
        );
        assert_eq!(
            FluxError::UnrecognizedResponse(json!([])).category(),
            "ResponseShapeUnrecognized"
        );
        assert_eq!(FluxError::Internal("x".into()).category(), "InternalError");
    }

    #[test]
    fn test_only_missing_config_is_fatal() {
        assert!(FluxError::ConfigurationMissing("REPLICATE_API_TOKEN".into()).is_fatal());
        assert!(!FluxError::InvalidInput("empty".into()).is_fatal());
        assert!(!FluxError::UnrecognizedResponse(json!(null)).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = FluxError::Provider {
            status: 404,
            message: "The requested resource could not be found.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Replicate API error (404): The requested resource could not be found."
        );
    }
}
