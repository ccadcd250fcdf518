use std::time::Duration;
use thiserror::Error;

/// Failure of a single raw request against a REST endpoint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

impl TransportError {
    /// A body that fails to decode will fail the same way on the next attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Decode(_))
    }
}

/// Tag used by callers to dispatch on a failure without inspecting its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    MalformedSample,
    ProtocolViolation,
    NoValidActions,
    EmptyMenu,
    OutOfDomain,
    Timeout,
    Configuration,
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("transport failed after {attempts} attempt(s): {cause}")]
    Transport {
        attempts: u32,
        #[source]
        cause: TransportError,
    },

    #[error("malformed sample: {reason}")]
    MalformedSample { reason: String },

    #[error("protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    #[error("no valid actions in a menu of {entries} entries")]
    NoValidActions { entries: usize },

    #[error("synthesis service returned an empty action menu")]
    EmptyMenu,

    #[error("state outside the controller domain: {reason}")]
    OutOfDomain { reason: String },

    #[error("timed out after {elapsed:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        elapsed: Duration,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::Transport { .. } => ErrorKind::Transport,
            ControlError::MalformedSample { .. } => ErrorKind::MalformedSample,
            ControlError::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
            ControlError::NoValidActions { .. } => ErrorKind::NoValidActions,
            ControlError::EmptyMenu => ErrorKind::EmptyMenu,
            ControlError::OutOfDomain { .. } => ErrorKind::OutOfDomain,
            ControlError::Timeout { .. } => ErrorKind::Timeout,
            ControlError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Only a bad configuration stops the process; everything else degrades to a stop action.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ControlError::MalformedSample {
            reason: reason.into(),
        }
    }

    pub fn violation(reason: impl Into<String>) -> Self {
        ControlError::ProtocolViolation {
            reason: reason.into(),
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
