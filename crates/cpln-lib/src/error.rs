//! Error types for the Control Plane client library

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Substrings that mark an API failure as throttling
const RATE_LIMIT_MARKERS: &[&str] = &["429", "rate limit"];

/// Errors raised by the discovery engine and its collaborators
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A payload was missing a required nested path or had the wrong shape
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Transport or HTTP failure reported by the API
    #[error("API error{}: {message}", format_status(.status))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// The caller supplied arguments that violate the call contract
    #[error("validation error: {0}")]
    Validation(String),

    /// Client configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// A background task ended without producing a result
    #[error("task failed: {0}")]
    Task(String),
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl Error {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status carried by an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns true if this error signals API throttling.
    ///
    /// Only API errors qualify; the decision is made on a 429 status or a
    /// rate-limit marker in the message.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Api { status, message } => {
                if *status == Some(429) {
                    return true;
                }
                let lowered = message.to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m))
            }
            _ => false,
        }
    }

    /// Returns true for 4xx API errors
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }

    /// Returns true for 5xx API errors
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if (500..600).contains(&s))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::api(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}
