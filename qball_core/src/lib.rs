//! Quantum 8-Ball Core - stochastic response orchestration
//!
//! One run of the demo:
//! 1. **Measure**: one shot of an n-qubit superposition on a local simulator
//! 2. **Look up**: the bitstring selects a `ResponseEntry` from a total table
//! 3. **Act**: the `ActionSequencer` drives the robot through the entry
//! 4. **Clean up**: the device session is closed on every connected path
//!
//! Remote hardware is consulted only for an illustrative side query and
//! never feeds the answer.

pub mod assets;
pub mod backend_selector;
pub mod config;
pub mod error;
pub mod measurement;
pub mod orchestrator;
pub mod response_table;
pub mod sequencer;
pub mod session;
pub mod simulator;

#[cfg(test)]
mod testing;

pub use assets::{AssetCatalog, FsImageLoader};
pub use backend_selector::{
    friendly_name, least_busy, BackendSelector, RemoteSelection, RemoteUnavailable, StaticProvider,
};
pub use config::RunConfig;
pub use error::{
    ConfigError, LookupError, MeasurementError, Recovered, RunError, TableError, STARTUP_EXIT_CODE,
};
pub use measurement::{superposition_circuit, MeasurementResult, MeasurementSource};
pub use orchestrator::{Orchestrator, RunReport};
pub use response_table::{ResponseEntry, ResponseTable, Sentiment, TerminalAction};
pub use sequencer::{
    ActionSequencer, DisplayHandoff, DockingAttempt, DockingOutcome, SequenceReport,
    SequencerConfig, SequencerState, DOCKING_RETRY_BOUND,
};
pub use session::DeviceSession;
pub use simulator::StatevectorSimulator;
