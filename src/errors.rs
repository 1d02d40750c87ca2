//! # Error Types Module
//!
//! Error types for the collaborators the dispatcher talks to. None of these
//! are fatal: the dispatcher logs them and answers the user with the generic
//! failure reply, leaving the conversation in `Idle`.

use thiserror::Error;

/// Failures while delivering messages or fetching media
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Outbound message could not be delivered
    #[error("Send failed: {0}")]
    Send(String),
    /// Media could not be downloaded from the transport
    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),
    /// Downloaded bytes are not an image we can forward
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),
    /// Recipient identifier could not be mapped to a transport address
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Failures of the inference gateway call
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Network-level failure
    #[error("Request failed: {0}")]
    Request(String),
    /// Non-success HTTP status
    #[error("Gateway returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// No answer within the configured bound
    #[error("Timed out after {0}s")]
    Timeout(u64),
    /// Too many recent failures, calls are short-circuited
    #[error("Circuit breaker open")]
    CircuitOpen,
}

/// Failures of the conversation store backend
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Conversation store unavailable: {0}")]
    Unavailable(String),
}

/// Anything that ends a prediction attempt without a result
#[derive(Debug, Clone, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Malformed(err.to_string())
        } else {
            GatewayError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::Status {
            status: 500,
            message: "Failed to process image".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Gateway returned status 500: Failed to process image"
        );

        let err = TransportError::MediaUnavailable("file expired".to_string());
        assert_eq!(err.to_string(), "Media unavailable: file expired");

        assert_eq!(GatewayError::Timeout(30).to_string(), "Timed out after 30s");
    }
}
