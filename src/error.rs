use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Visual source unavailable: {0}")]
    #[diagnostic(
        code(snapcal::source_unavailable),
        help("Check that the snapshot path exists and is readable, then start scanning again")
    )]
    SourceUnavailable(String),

    #[error("Could not understand the date and time in: {0}")]
    #[diagnostic(code(snapcal::no_date_found))]
    NoDateFound(String),

    #[error("Could not determine when the event starts: {0}")]
    #[diagnostic(code(snapcal::ambiguous_start))]
    AmbiguousStart(String),

    #[error("Recognizer error: {0}")]
    #[diagnostic(code(snapcal::recognizer))]
    Recognizer(String),

    #[error("Calendar encoding error: {0}")]
    #[diagnostic(code(snapcal::encoding))]
    Encoding(String),

    #[error("No tracked event with id {0}")]
    #[diagnostic(code(snapcal::event_not_found))]
    EventNotFound(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(snapcal::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(snapcal::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(snapcal::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(snapcal::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(snapcal::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(snapcal::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Errors that only affect a single candidate of a detection batch
    pub fn is_per_candidate(&self) -> bool {
        matches!(
            self,
            Error::NoDateFound(_) | Error::AmbiguousStart(_) | Error::Encoding(_)
        )
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create source errors
pub fn source_error(message: &str) -> Error {
    Error::SourceUnavailable(message.to_string())
}

/// Helper to create recognizer errors
pub fn recognizer_error(message: &str) -> Error {
    Error::Recognizer(message.to_string())
}

/// Helper to create encoding errors
pub fn encoding_error(message: &str) -> Error {
    Error::Encoding(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_candidate_errors() {
        assert!(Error::NoDateFound("x".into()).is_per_candidate());
        assert!(Error::AmbiguousStart("x".into()).is_per_candidate());
        assert!(encoding_error("bad").is_per_candidate());
        assert!(!source_error("camera").is_per_candidate());
        assert!(!recognizer_error("timeout").is_per_candidate());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            env_error("OPENAI_API_KEY").to_string(),
            "Environment error: Missing environment variable: OPENAI_API_KEY"
        );
        assert_eq!(
            Error::EventNotFound("abc".into()).to_string(),
            "No tracked event with id abc"
        );
    }
}
