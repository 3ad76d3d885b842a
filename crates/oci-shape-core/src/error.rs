//! Error types for remote shape sources

use thiserror::Error;

/// Errors reported by a [`RemoteShapeSource`](crate::RemoteShapeSource)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeSourceError {
    /// The service answered with a non-success status
    #[error("Service error ({status}): {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShapeSourceError {
    /// Create a service error
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
