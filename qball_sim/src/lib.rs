//! Quantum 8-Ball Deterministic Simulation Harness
//!
//! Runs the real orchestrator against simulated collaborators so every
//! path through a run can be reproduced from a single 64-bit seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: `SimContext` reads the paused tokio clock that also bounds device calls
//! - **Robot**: `SimRobot` with a `FaultPlan` and a call journal
//! - **Quantum**: scripted or seeded simulators, simulated remote provider
//! - **Randomness**: every stream derived from the master seed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                       │
//! │                                                          │
//! │   SimContext ──► Orchestrator ──► SimRobot ──► Journal   │
//! │        │             │   │                        │      │
//! │        │     Measurement  BackendSelector         │      │
//! │        │      (scripted)   (SimRemoteProvider)    │      │
//! │        ▼                                          ▼      │
//! │                 checks ──► ScenarioResult ──► SimExport  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use qball_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42, RunConfig::default())?;
//! let result = runner.run(ScenarioId::Negative).await;
//! assert!(result.passed);
//! ```

mod backends;
mod context;
mod exporter;
mod images;
mod remote;
mod robot;
mod runner;
pub mod scenarios;

use thiserror::Error;

pub use backends::{ScriptedBackend, UnavailableBackend};
pub use context::SimContext;
pub use exporter::{RunTranscript, SimExport};
pub use images::SimImageLoader;
pub use remote::{RemoteFault, SimRemoteProvider};
pub use robot::{AccessoryPresence, DeviceCall, DeviceJournal, FaultPlan, JournalEntry, SimRobot};
pub use runner::{ScenarioResult, ScenarioRunner};

/// Exit code when a run violates one of the harness checks.
pub const CHECK_FAILURE_EXIT_CODE: i32 = 4;

/// Harness errors outside of a run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] qball_core::ConfigError),

    #[error("Cannot write export {path}: {source}")]
    Export {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
