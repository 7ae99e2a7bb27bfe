use jobtrack_api::ClassifiedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}

/// Failures surfaced by session transitions and retried operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Classified(#[from] ClassifiedError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Another sign-in is already in progress")]
    TransitionInFlight,

    #[error("Operation aborted before it could run")]
    Aborted,
}

impl SessionError {
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            SessionError::Classified(err) => Some(err),
            _ => None,
        }
    }
}
