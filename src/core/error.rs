use std::error::Error;
use std::fmt::{self, Display};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;

/// Error type for everything below the HTTP handlers
#[derive(Debug)]
pub enum MensableError {
    /// User input rejected; the message is shown to the user as-is
    Validation(String),
    /// Error reported by the SQLite store
    Database(rusqlite::Error),
    /// Stored JSON column could not be encoded or decoded
    Serialization(serde_json::Error),
    /// Page template failed to render
    Template(String),
    /// Multipart upload could not be read
    Upload(String),
    /// The store mutex was poisoned by a panicking request
    LockPoisoned,
    /// Invalid configuration value
    Config(String),
}

impl Display for MensableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MensableError::Validation(msg) => write!(f, "{}", msg),
            MensableError::Database(err) => write!(f, "Database error: {}", err),
            MensableError::Serialization(err) => write!(f, "Serialization error: {}", err),
            MensableError::Template(msg) => write!(f, "Template error: {}", msg),
            MensableError::Upload(msg) => write!(f, "Upload error: {}", msg),
            MensableError::LockPoisoned => write!(f, "Database lock poisoned"),
            MensableError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for MensableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MensableError::Database(err) => Some(err),
            MensableError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for MensableError {
    fn from(err: rusqlite::Error) -> Self {
        MensableError::Database(err)
    }
}

impl From<serde_json::Error> for MensableError {
    fn from(err: serde_json::Error) -> Self {
        MensableError::Serialization(err)
    }
}

impl ResponseError for MensableError {
    fn status_code(&self) -> StatusCode {
        match self {
            MensableError::Validation(_) | MensableError::Upload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error!("Request failed: {}", self);
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MensableError>;
