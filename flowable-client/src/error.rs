//! Error types for the Flowable client.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when using the Flowable client.
///
/// Every status-derived variant carries the HTTP status and the best message
/// that could be extracted from the response body.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the request (400).
    #[error("Bad request (status {status}): {message}")]
    BadRequest {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// Credentials were missing or wrong (401).
    #[error("Unauthorized (status {status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// The user may not perform the operation (403).
    #[error("Forbidden (status {status}): {message}")]
    Forbidden {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// The addressed resource does not exist (404).
    #[error("Not found (status {status}): {message}")]
    NotFound {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// The operation conflicts with the current server state (409).
    #[error("Conflict (status {status}): {message}")]
    Conflict {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// Any other non-success response.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// Failed to deserialize response.
    #[error("Failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// Invalid URL or connection settings.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response did not have the expected shape.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// A local file could not be read for upload.
    #[error("Cannot read file {path:?}: {source}")]
    Io {
        /// The file that was requested.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// `wait_for_task` gave up before the task appeared.
    #[error("Timed out after {timeout:?} waiting for task '{name}'")]
    TaskTimeout {
        /// Name of the awaited task.
        name: String,
        /// The configured timeout.
        timeout: Duration,
    },

    /// A workflow wrapper was used before an instance was started or loaded.
    #[error("No {0} is loaded")]
    NotLoaded(&'static str),
}

impl ClientError {
    /// Build the error variant matching an HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest { status, message },
            401 => Self::Unauthorized { status, message },
            403 => Self::Forbidden { status, message },
            404 => Self::NotFound { status, message },
            409 => Self::Conflict { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// HTTP status of a status-derived error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { status, .. }
            | Self::Unauthorized { status, .. }
            | Self::Forbidden { status, .. }
            | Self::NotFound { status, .. }
            | Self::Conflict { status, .. }
            | Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-provided message of a status-derived error.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether this is a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ClientError::from_status(400, "x"),
            ClientError::BadRequest { status: 400, .. }
        ));
        assert!(matches!(
            ClientError::from_status(401, "x"),
            ClientError::Unauthorized { .. }
        ));
        assert!(matches!(
            ClientError::from_status(403, "x"),
            ClientError::Forbidden { .. }
        ));
        assert!(ClientError::from_status(404, "x").is_not_found());
        assert!(matches!(
            ClientError::from_status(409, "x"),
            ClientError::Conflict { .. }
        ));
        assert!(matches!(
            ClientError::from_status(500, "x"),
            ClientError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_status_and_message_accessors() {
        let err = ClientError::from_status(404, "Could not find a task with id '7'.");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), Some("Could not find a task with id '7'."));

        let err = ClientError::NotLoaded("case instance");
        assert_eq!(err.status(), None);
        assert_eq!(err.message(), None);
    }

    #[test]
    fn test_timeout_display_names_task() {
        let err = ClientError::TaskTimeout {
            name: "Review".to_string(),
            timeout: Duration::from_secs(2),
        };
        let display = err.to_string();
        assert!(display.contains("Review"));
        assert!(display.contains("2s"));
    }
}
