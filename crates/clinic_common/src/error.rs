use std::fmt;
use thiserror::Error;

/// The base error type for the clinic service.
///
/// Each crate keeps its own error enum and converts into `ClinicError` at the
/// HTTP boundary.
#[derive(Error, Debug)]
pub enum ClinicError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., resource already exists)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// The resource exists but is not in a state that allows the operation
    #[error("Invalid state: {0}")]
    InvalidStateError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for ClinicError {
    fn status_code(&self) -> u16 {
        match self {
            ClinicError::HttpError(_) => 500,
            ClinicError::ParseError(_) => 400,
            ClinicError::ConfigError(_) => 500,
            ClinicError::ValidationError(_) => 400,
            ClinicError::DatabaseError(_) => 500,
            ClinicError::ExternalServiceError { .. } => 502,
            ClinicError::ConflictError(_) => 409,
            ClinicError::NotFoundError(_) => 404,
            ClinicError::InvalidStateError(_) => 422,
            ClinicError::TimeoutError(_) => 504,
            ClinicError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, ClinicError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, ClinicError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, ClinicError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| ClinicError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, ClinicError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| ClinicError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for ClinicError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClinicError::TimeoutError(err.to_string())
        } else {
            ClinicError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(err: serde_json::Error) -> Self {
        ClinicError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for ClinicError {
    fn from(err: std::io::Error) -> Self {
        ClinicError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> ClinicError {
    ClinicError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> ClinicError {
    ClinicError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> ClinicError {
    ClinicError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> ClinicError {
    ClinicError::ConflictError(message.to_string())
}

pub fn invalid_state<T: fmt::Display>(message: T) -> ClinicError {
    ClinicError::InvalidStateError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> ClinicError {
    ClinicError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> ClinicError {
    ClinicError::InternalError(message.to_string())
}
