//! Run configuration.
//!
//! Defaults reproduce the classic demo: three qubits, one-second settle
//! delay before taking back the face display, ten seconds per image and a
//! 1024-shot illustrative run on remote hardware.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::AssetCatalog;
use crate::error::ConfigError;
use crate::response_table::ResponseTable;
use crate::sequencer::{DisplayHandoff, SequencerConfig, DOCKING_RETRY_BOUND};

/// Configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Register size; selects the built-in table when no table file is given
    pub qubits: usize,

    /// Directory holding the face images
    pub asset_dir: PathBuf,

    /// Image shown right after connecting
    pub intro_image: Option<String>,

    /// Spoken before every answer
    pub preamble: Option<String>,

    /// Optional JSON response table overriding the built-in one
    pub response_table: Option<PathBuf>,

    /// Optional JSON snapshot of remote backends
    pub remote_backends: Option<PathBuf>,

    pub connect_timeout_ms: u64,
    pub call_timeout_ms: u64,
    pub accessory_seek_timeout_ms: u64,
    pub remote_timeout_ms: u64,

    /// Docking maneuvers before giving up (1..=4)
    pub docking_attempts: u32,

    pub display_duration_ms: u64,
    pub handoff: DisplayHandoff,

    /// Ask the least busy remote device to run the circuit after answering
    pub remote_side_query: bool,
    pub remote_shots: u32,

    /// Shots of the illustrative local histogram (0 disables it)
    pub simulation_shots: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            qubits: 3,
            asset_dir: PathBuf::from("images"),
            intro_image: Some("qiskit-logo.png".to_string()),
            preamble: Some("The Quantum 8-ball says, ".to_string()),
            response_table: None,
            remote_backends: None,
            connect_timeout_ms: 10_000,
            call_timeout_ms: 10_000,
            accessory_seek_timeout_ms: 5_000,
            remote_timeout_ms: 15_000,
            docking_attempts: DOCKING_RETRY_BOUND,
            display_duration_ms: 10_000,
            handoff: DisplayHandoff::default(),
            remote_side_query: true,
            remote_shots: 1024,
            simulation_shots: 1024,
        }
    }
}

impl RunConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qubits == 0 {
            return Err(ConfigError::Parse("qubits must be at least 1".into()));
        }
        if !(1..=DOCKING_RETRY_BOUND).contains(&self.docking_attempts) {
            return Err(ConfigError::Parse(format!(
                "docking_attempts must be within 1..={}",
                DOCKING_RETRY_BOUND
            )));
        }
        if let DisplayHandoff::PollUntilAcquired { max_polls: 0, .. } = self.handoff {
            return Err(ConfigError::Parse("max_polls must be at least 1".into()));
        }
        Ok(())
    }

    /// Loads the response table: the configured file, else the built-in one.
    pub fn load_table(&self) -> Result<ResponseTable, ConfigError> {
        let table = match &self.response_table {
            Some(path) => ResponseTable::from_json_file(path)?,
            None => ResponseTable::builtin(self.qubits)?,
        };
        if table.qubits() != self.qubits {
            return Err(ConfigError::Parse(format!(
                "response table covers {} qubits but config asks for {}",
                table.qubits(),
                self.qubits
            )));
        }
        Ok(table)
    }

    pub fn assets(&self) -> AssetCatalog {
        AssetCatalog::new(&self.asset_dir)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            accessory_seek_timeout: Duration::from_millis(self.accessory_seek_timeout_ms),
            docking_attempts: self.docking_attempts,
            handoff: self.handoff,
            display_duration: Duration::from_millis(self.display_duration_ms),
            preamble: self.preamble.clone(),
            ..SequencerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.load_table().unwrap().len(), 8);
        assert_eq!(config.sequencer_config().docking_attempts, 4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{"qubits": 1, "handoff": {"mode": "poll_until_acquired", "interval_ms": 100, "max_polls": 20}}"#,
        )
        .unwrap();
        assert_eq!(config.qubits, 1);
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.handoff,
            DisplayHandoff::PollUntilAcquired {
                interval_ms: 100,
                max_polls: 20
            }
        );
        assert_eq!(config.load_table().unwrap().len(), 2);
    }

    #[test]
    fn test_docking_attempts_capped() {
        let config = RunConfig {
            docking_attempts: 5,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_no_builtin_for_two_qubits() {
        let config = RunConfig {
            qubits: 2,
            ..RunConfig::default()
        };
        assert!(matches!(config.load_table(), Err(ConfigError::Table(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let err = RunConfig::from_json_file(Path::new("/nonexistent/qball.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
