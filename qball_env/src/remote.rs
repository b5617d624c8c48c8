//! Remote quantum provider contract (cloud hardware backends).

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::quantum::Circuit;
use crate::types::{BackendDescriptor, Counts};

/// Access to a provider of remote quantum backends.
///
/// Everything behind this trait is optional flavor: callers must treat
/// every error as "remote unavailable" and carry on locally.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Loads and checks stored credentials.
    async fn authenticate(&self) -> Result<(), RemoteError>;

    /// Enumerates backends, filtered by whether they are simulators.
    async fn list_backends(&self, simulator: bool) -> Result<Vec<BackendDescriptor>, RemoteError>;

    /// Submits a circuit to a named backend and waits for its counts.
    async fn submit(&self, backend: &str, circuit: &Circuit, shots: u32) -> Result<Counts, RemoteError>;
}
