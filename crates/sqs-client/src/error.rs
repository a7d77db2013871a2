//! Error types for SQS operations.

use thiserror::Error;

/// Comprehensive error type for all SQS operations
#[derive(Debug, Error)]
pub enum SqsError {
    /// The request never produced an HTTP response (connection, DNS, timeout).
    #[error("Error in request to AWS service: {message}")]
    Http { message: String },

    /// The service returned an `<Error>` payload that no specific rule matched.
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{message}")]
    InvalidQueue { message: String, name: String },

    #[error("{message}")]
    InvalidAttribute { message: String, name: String },

    #[error("{message}")]
    InvalidTimeout { message: String, timeout: i64 },

    #[error("{message}")]
    InvalidMessage { message: String, body: String },

    #[error("{message}")]
    InvalidPermissionLabel { message: String, label: String },

    /// The MD5 digest reported by the service does not match the sent body.
    #[error("{message}")]
    Checksum { message: String, message_id: String },

    /// A caller-supplied argument was rejected before any request was made.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl SqsError {
    /// Check if error is transient
    ///
    /// Only transport failures qualify. Server faults (5xx) are already retried
    /// inside the transport and surface as [`SqsError::Service`] when they persist.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Service(_) => false,
            Self::InvalidQueue { .. } => false,
            Self::InvalidAttribute { .. } => false,
            Self::InvalidTimeout { .. } => false,
            Self::InvalidMessage { .. } => false,
            Self::InvalidPermissionLabel { .. } => false,
            Self::Checksum { .. } => false,
            Self::InvalidArgument { .. } => false,
        }
    }

    /// Get the service error code, if this error came from an `<Error>` payload
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Service(e) => Some(e.code()),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Generic error reported by the service in an `<Error>` element
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    code: String,
    message: String,
}

impl ServiceError {
    /// Create a service error from its `Code` and `Message` text
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error code, e.g. `AWS.SimpleQueueService.NonExistentQueue`
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable message supplied by the service
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
