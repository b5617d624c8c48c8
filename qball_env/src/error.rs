//! Error types for the collaborator contracts.

use thiserror::Error;

/// Errors reported by the robot driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Handshake failed or the link dropped
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The device did not acknowledge in time
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// The device refused or failed the request
    #[error("Device rejected request: {0}")]
    Rejected(String),

    /// A call was issued without a live connection
    #[error("Device not connected")]
    NotConnected,
}

impl DeviceError {
    /// Creates an unreachable error.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// Creates a rejected error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Creates a timeout error from the elapsed bound.
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::Timeout(limit.as_millis() as u64)
    }
}

/// Errors from a quantum execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Backend supports {supported} qubits, circuit needs {requested}")]
    TooManyQubits { requested: usize, supported: usize },

    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    #[error("Backend offline: {0}")]
    Offline(String),
}

/// Errors from a remote (cloud) quantum provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network or service outage
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Job refused by the provider
    #[error("Job rejected: {0}")]
    Rejected(String),
}

/// Errors from the image decoding collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("Asset missing: {0}")]
    Missing(String),

    #[error("Decode error: {0}")]
    Decode(String),
}
