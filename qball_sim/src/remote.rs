//! Simulated remote quantum provider.

use async_trait::async_trait;
use qball_env::{BackendDescriptor, Circuit, Counts, RemoteError, RemoteProvider};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Which provider call, if any, misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RemoteFault {
    #[default]
    None,
    /// Stored credentials are rejected
    Authentication,
    /// Listing backends fails
    Connectivity,
    /// Listing works, job submission fails
    JobRejected,
}

/// Provider with a scripted backend listing.
///
/// Submitted jobs return a uniform histogram drawn from its own RNG.
pub struct SimRemoteProvider {
    backends: Vec<BackendDescriptor>,
    fault: RemoteFault,
    rng: Mutex<ChaCha8Rng>,
}

impl SimRemoteProvider {
    pub fn new(backends: Vec<BackendDescriptor>, fault: RemoteFault, rng: ChaCha8Rng) -> Self {
        Self {
            backends,
            fault,
            rng: Mutex::new(rng),
        }
    }

    /// The two historical hardware devices plus the cloud simulator.
    pub fn default_listing() -> Vec<BackendDescriptor> {
        vec![
            BackendDescriptor::new("ibmq_qasm_simulator", 0, true),
            BackendDescriptor::new("ibmqx4", 4, false),
            BackendDescriptor::new("ibmq_16_melbourne", 11, false),
        ]
    }
}

#[async_trait]
impl RemoteProvider for SimRemoteProvider {
    async fn authenticate(&self) -> Result<(), RemoteError> {
        match self.fault {
            RemoteFault::Authentication => Err(RemoteError::Authentication(
                "stored API token was rejected".into(),
            )),
            _ => Ok(()),
        }
    }

    async fn list_backends(&self, simulator: bool) -> Result<Vec<BackendDescriptor>, RemoteError> {
        if self.fault == RemoteFault::Connectivity {
            return Err(RemoteError::Connectivity("provider API unreachable".into()));
        }
        Ok(self
            .backends
            .iter()
            .filter(|b| b.is_simulator == simulator)
            .cloned()
            .collect())
    }

    async fn submit(&self, backend: &str, circuit: &Circuit, shots: u32) -> Result<Counts, RemoteError> {
        if self.fault == RemoteFault::JobRejected {
            return Err(RemoteError::Rejected(format!("{} queue is closed", backend)));
        }
        if !self.backends.iter().any(|b| b.name == backend) {
            return Err(RemoteError::Rejected(format!("unknown backend {}", backend)));
        }

        let qubits = circuit.qubits();
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut counts = Counts::new();
        for _ in 0..shots {
            let index: u64 = rng.gen_range(0..(1u64 << qubits));
            counts.record(format!("{:0width$b}", index, width = qubits));
        }
        Ok(counts)
    }
}
