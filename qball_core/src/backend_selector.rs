//! BackendSelector - best-effort pick of a remote hardware backend.
//!
//! Remote hardware is flavor: it never produces the answer and never fails
//! a run. Every provider error is turned into a `RemoteUnavailable` reason
//! right here so callers only ever see an explicit selection value.

use qball_env::{BackendDescriptor, Circuit, Counts, RemoteError, RemoteProvider};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ConfigError;

/// Why no remote backend was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RemoteUnavailable {
    /// No provider configured for this run
    NotConfigured,
    /// Credentials missing or rejected
    Authentication(String),
    /// Provider unreachable or too slow
    Connectivity(String),
    /// Provider reachable but lists no hardware
    NoHardwareBackends,
}

impl std::fmt::Display for RemoteUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteUnavailable::NotConfigured => write!(f, "no remote provider configured"),
            RemoteUnavailable::Authentication(msg) => write!(f, "authentication: {}", msg),
            RemoteUnavailable::Connectivity(msg) => write!(f, "connectivity: {}", msg),
            RemoteUnavailable::NoHardwareBackends => write!(f, "no hardware backends listed"),
        }
    }
}

/// Result of remote backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "backend", rename_all = "snake_case")]
pub enum RemoteSelection {
    Selected(BackendDescriptor),
    Unavailable(RemoteUnavailable),
}

impl RemoteSelection {
    pub fn backend(&self) -> Option<&BackendDescriptor> {
        match self {
            RemoteSelection::Selected(b) => Some(b),
            RemoteSelection::Unavailable(_) => None,
        }
    }
}

/// Least busy non-simulator backend; ties go to the first enumerated.
pub fn least_busy(backends: &[BackendDescriptor]) -> Option<&BackendDescriptor> {
    backends
        .iter()
        .filter(|b| !b.is_simulator)
        .min_by_key(|b| b.queued_job_count)
}

/// Human-readable device name for announcements.
pub fn friendly_name(backend: &str) -> String {
    match backend {
        "ibmqx4" => "IBM 5 qubit quantum computer in New York".to_string(),
        "ibmq_16_melbourne" => "IBM 16 qubit quantum computer in Melbourne, Australia".to_string(),
        other => other.to_string(),
    }
}

fn unavailable_from(err: RemoteError) -> RemoteUnavailable {
    match err {
        RemoteError::Authentication(msg) => RemoteUnavailable::Authentication(msg),
        RemoteError::Connectivity(msg) | RemoteError::Rejected(msg) => {
            RemoteUnavailable::Connectivity(msg)
        }
    }
}

/// Selects a remote backend through an optional provider.
pub struct BackendSelector {
    provider: Option<Box<dyn RemoteProvider>>,
    timeout: Duration,
}

impl BackendSelector {
    /// Selector with no provider; always reports `NotConfigured`.
    pub fn offline() -> Self {
        Self {
            provider: None,
            timeout: Duration::ZERO,
        }
    }

    /// Selector over a provider. `timeout` bounds the whole selection and,
    /// separately, each side query.
    pub fn new(provider: Box<dyn RemoteProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Connectivity(format!(
                "no response within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }

    /// Picks the least busy hardware backend, or says why none is available.
    pub async fn select_remote(&self) -> RemoteSelection {
        let Some(provider) = self.provider.as_deref() else {
            return RemoteSelection::Unavailable(RemoteUnavailable::NotConfigured);
        };

        // Authentication and listing share one deadline
        let listing = async {
            provider.authenticate().await?;
            provider.list_backends(false).await
        };
        let backends = match self.bounded(listing).await {
            Ok(backends) => backends,
            Err(e) => {
                warn!(
                    "No connection with the API for remote backends ({}); only the local simulator is available",
                    e
                );
                return RemoteSelection::Unavailable(unavailable_from(e));
            }
        };
        debug!("Remote backends: {:?}", backends);

        match least_busy(&backends) {
            Some(backend) => {
                info!(
                    "Least busy device: {} ({} queued)",
                    backend.name, backend.queued_job_count
                );
                RemoteSelection::Selected(backend.clone())
            }
            None => {
                warn!("All devices are currently unavailable");
                RemoteSelection::Unavailable(RemoteUnavailable::NoHardwareBackends)
            }
        }
    }

    /// Runs the circuit on the selected backend for illustration only.
    pub async fn side_query(
        &self,
        backend: &BackendDescriptor,
        circuit: &Circuit,
        shots: u32,
    ) -> Result<Counts, RemoteError> {
        let provider = self
            .provider
            .as_deref()
            .ok_or_else(|| RemoteError::Connectivity("no remote provider configured".into()))?;
        self.bounded(provider.submit(&backend.name, circuit, shots))
            .await
    }
}

/// Provider backed by a JSON snapshot of a backend listing.
///
/// Useful offline: selection works, job submission is refused.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    backends: Vec<BackendDescriptor>,
}

impl StaticProvider {
    pub fn new(backends: Vec<BackendDescriptor>) -> Self {
        Self { backends }
    }

    /// Reads `[{"name": .., "queued_job_count": .., "is_simulator": ..}, ..]`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let backends: Vec<BackendDescriptor> =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self::new(backends))
    }

    pub fn backends(&self) -> &[BackendDescriptor] {
        &self.backends
    }
}

#[async_trait::async_trait]
impl RemoteProvider for StaticProvider {
    async fn authenticate(&self) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn list_backends(&self, simulator: bool) -> Result<Vec<BackendDescriptor>, RemoteError> {
        Ok(self
            .backends
            .iter()
            .filter(|b| b.is_simulator == simulator)
            .cloned()
            .collect())
    }

    async fn submit(&self, backend: &str, _circuit: &Circuit, _shots: u32) -> Result<Counts, RemoteError> {
        Err(RemoteError::Rejected(format!(
            "{} is a static snapshot entry and cannot run jobs",
            backend
        )))
    }
}
