//! Error taxonomy for a run.
//!
//! Only `RunError` interrupts a run. Everything else that can go wrong is
//! caught at the step where it happens and recorded as a `Recovered` value.

use qball_env::DeviceError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Measurement could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasurementError {
    #[error("No simulation backend available: {0}")]
    BackendUnavailable(String),

    #[error("Backend returned malformed counts: {0}")]
    MalformedCounts(String),

    #[error("Qubit count must be at least 1, got {0}")]
    InvalidQubitCount(usize),
}

/// Measurement does not fit the response table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Invalid measurement '{actual}': table expects {expected} bits")]
    InvalidMeasurement { expected: usize, actual: String },
}

/// A response table violates totality or the sentiment policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Response table needs at least one qubit")]
    NoQubits,

    #[error("{qubits}-qubit table needs {expected} entries, found {actual}")]
    WrongEntryCount {
        qubits: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Key '{key}' is not a {qubits}-bit string")]
    InvalidKey { key: String, qubits: usize },

    #[error("Duplicate entry for '{0}'")]
    DuplicateKey(String),

    #[error("Table needs exactly one affirmative entry, found {0}")]
    AffirmativeCount(usize),

    #[error("Table needs exactly one negative entry, found {0}")]
    NegativeCount(usize),

    #[error("No built-in table for {0} qubits")]
    NoBuiltin(usize),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Startup failures: bad configuration or missing install assets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(String),

    #[error("Response table: {0}")]
    Table(#[from] TableError),

    #[error("Asset directory not found: {0}")]
    AssetDirMissing(PathBuf),
}

/// Fatal errors. The run aborts (after cleanup) and exits non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("FatalConnectError: {0}")]
    FatalConnect(DeviceError),

    #[error("MeasurementError: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("MeasurementError: {0}")]
    InvalidMeasurement(#[from] LookupError),
}

impl RunError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::FatalConnect(_) => 1,
            RunError::Measurement(_) | RunError::InvalidMeasurement(_) => 2,
        }
    }
}

/// Exit code for startup failures.
pub const STARTUP_EXIT_CODE: i32 = 3;

/// A non-fatal failure, caught at its step and converted to "skip".
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum Recovered {
    #[error("remote backend unavailable: {0}")]
    RemoteBackend(String),

    #[error("remote side query failed: {0}")]
    SideQuery(String),

    #[error("could not leave charger: {0}")]
    Undock(String),

    #[error("accessory unavailable: {0}")]
    AccessoryUnavailable(String),

    #[error("docking failed after {attempts} attempts")]
    DockingFailed { attempts: u32 },

    #[error("asset missing: {0}")]
    AssetMissing(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("display control unavailable: {0}")]
    DisplayControl(String),

    #[error("image display failed: {0}")]
    Display(String),

    #[error("speech failed: {0}")]
    Speech(String),

    #[error("pose change failed: {0}")]
    Pose(String),

    #[error("animation '{name}' failed: {reason}")]
    AnimationPlayback { name: String, reason: String },

    #[error("terminal action failed: {0}")]
    TerminalAction(String),
}
