//! # Error Handling
//!
//! Error types for the capture pipeline. Schema inference itself is total;
//! everything that can fail lives around it: configuration, the outbound
//! import call, and decoding captured bodies.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Custom result type for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the capture pipeline
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors (missing project ID or access token, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors talking to the import service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Captured payload could not be decoded
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Wrap a serde_json error with context
    pub fn serialization<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Serialization { source, context: context.into() }
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration_error",
            Error::Transport(_) => "transport_error",
            Error::Serialization { .. } => "serialization_error",
            Error::Validation(_) => "validation_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error, "JSON serialization failed")
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        fields.sort();
        Self::Config(fields.join("; "))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Errors raised inside the capture middleware surface as a 500 so the
/// calling test fails instead of silently dropping the documentation.
impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody { error: self.kind(), message: self.to_string() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
