//! Error types shared by the filter engine and the transport boundary.
//!
//! Every failure on the message path is an explicit variant here, and
//! [`FilterError::ack`] maps each one to the acknowledgment the transport
//! receives. Nothing on the message path is allowed to escape as a panic.

use crate::transport::AckDecision;

/// A payload the filter could not interpret as a telemetry document.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("payload is not a telemetry document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("telemetry document has no machine temperature")]
    MissingTemperature,
}

/// Failure reported by an output publisher.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("output route '{route}' is closed")]
    Closed { route: String },

    #[error("message cannot be encoded for the wire: {0}")]
    Encoding(String),

    #[error("failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid desired property '{key}': {reason}")]
    ConfigParse { key: String, reason: String },

    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl FilterError {
    /// Acknowledgment owed to the transport when processing ends with this error.
    ///
    /// A message that cannot be decoded is simply not alerted on, so it is
    /// completed. Any other failure abandons the message so the transport may
    /// redeliver it.
    pub fn ack(&self) -> AckDecision {
        match self {
            FilterError::Decode(_) => AckDecision::Completed,
            FilterError::ConfigParse { .. }
            | FilterError::Publish(_)
            | FilterError::Unexpected(_) => AckDecision::Abandoned,
        }
    }
}
