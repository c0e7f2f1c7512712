use std::fmt;

use thiserror::Error;

/// Failure reported by a [`MessageTransport`](crate::transport::MessageTransport).
///
/// Every variant is recoverable at the conversation scope. The session turns
/// these into a [`Notice`] and never lets them escape to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Expired or invalid credential.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Store unreachable, connection reset, or body could not be read.
    #[error("network failure: {0}")]
    Network(String),

    /// The store rejected the request content.
    #[error("request rejected: {0}")]
    Validation(String),

    /// The thread or message no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other status, or a body that does not decode.
    #[error("unexpected response{}: {reason}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    UnexpectedResponse { status: Option<u16>, reason: String },
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Network(_) => ErrorKind::Network,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UnexpectedResponse { .. } => ErrorKind::Unexpected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Network,
    Validation,
    NotFound,
    Unexpected,
}

/// The session operation a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadHistory,
    Send,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadHistory => f.write_str("load messages"),
            Self::Send => f.write_str("send message"),
            Self::Delete => f.write_str("delete message"),
        }
    }
}

/// User-visible, non-fatal report of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: Operation,
    pub kind: ErrorKind,
    pub message: String,
}

impl Notice {
    pub fn from_error(operation: Operation, error: &TransportError) -> Self {
        Self {
            operation,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not {}: {}", self.operation, self.message)
    }
}
