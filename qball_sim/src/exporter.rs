//! JSON exporter for run transcripts.
//!
//! One transcript per scenario: the orchestrator's report (trace, docking
//! attempts, recovered errors) next to every call the robot received.

use qball_core::RunReport;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::robot::JournalEntry;
use crate::runner::ScenarioResult;

/// Transcript of a single scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunTranscript {
    pub scenario: String,
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    pub exit_code: i32,

    /// Virtual milliseconds the run took
    pub elapsed_ms: u64,

    pub report: RunReport,
    pub device_calls: Vec<JournalEntry>,
}

impl From<&ScenarioResult> for RunTranscript {
    fn from(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario.name().to_string(),
            passed: result.passed,
            failure_reason: result.failure_reason.clone(),
            exit_code: result.report.exit_code(),
            elapsed_ms: result.report.elapsed_ms,
            report: result.report.clone(),
            device_calls: result.journal.clone(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize)]
pub struct SimExport {
    /// Seed used
    pub seed: u64,

    pub qubits: usize,

    /// All runs, in execution order
    pub runs: Vec<RunTranscript>,

    /// True when every run passed its checks
    pub passed: bool,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(seed: u64, qubits: usize) -> Self {
        Self {
            seed,
            qubits,
            runs: Vec::new(),
            passed: true,
        }
    }

    /// Adds a run.
    pub fn add_run(&mut self, result: &ScenarioResult) {
        self.passed &= result.passed;
        self.runs.push(RunTranscript::from(result));
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
