//! Orchestrator - one end-to-end run.
//!
//! ```text
//! connect ──fail──────────────────────────────────────────┐
//!    │                                                    │
//!    ▼                                                    │
//! intro image → measure ──fail──┐                         │
//!                  │            │                         │
//!                  ▼            │                         │
//!               lookup ──fail───┤                         │
//!                  │            │                         │
//!                  ▼            ▼                         ▼
//!           ActionSequencer → remote flavor → close() → Disconnected
//! ```
//!
//! Once connected, `close()` runs on every path. A failed connect has
//! nothing to close.

use qball_env::{Counts, ImageLoader, QballContext, RobotDevice};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backend_selector::{friendly_name, BackendSelector, RemoteSelection, RemoteUnavailable};
use crate::config::RunConfig;
use crate::error::{Recovered, RunError};
use crate::measurement::{superposition_circuit, MeasurementResult, MeasurementSource};
use crate::response_table::{ResponseTable, Sentiment};
use crate::sequencer::{
    ActionSequencer, DockingAttempt, DockingOutcome, SequenceReport, SequencerState,
};
use crate::session::{bounded, DeviceSession};

/// Outcome of a run, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,

    /// Context seed (0 in production)
    pub seed: u64,

    pub measurement: Option<MeasurementResult>,
    pub sentiment: Option<Sentiment>,
    pub phrase: Option<String>,

    /// States visited, `Disconnected` first and last
    pub trace: Vec<SequencerState>,

    pub docking: DockingOutcome,
    pub docking_attempts: Vec<DockingAttempt>,
    pub image_shown: bool,
    pub animations_played: Vec<String>,

    /// Every non-fatal failure, in order
    pub recovered: Vec<Recovered>,

    pub remote: RemoteSelection,
    pub remote_counts: Option<Counts>,
    pub simulation_counts: Option<Counts>,

    /// Virtual or wall time the run took
    pub elapsed_ms: u64,

    /// Fatal error message, if the run aborted
    pub fatal: Option<String>,

    #[serde(skip)]
    pub error: Option<RunError>,
}

impl RunReport {
    fn new(seed: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed,
            measurement: None,
            sentiment: None,
            phrase: None,
            trace: Vec::new(),
            docking: DockingOutcome::Skipped,
            docking_attempts: Vec::new(),
            image_shown: false,
            animations_played: Vec::new(),
            recovered: Vec::new(),
            remote: RemoteSelection::Unavailable(RemoteUnavailable::NotConfigured),
            remote_counts: None,
            simulation_counts: None,
            elapsed_ms: 0,
            fatal: None,
            error: None,
        }
    }

    fn enter(&mut self, state: SequencerState) {
        info!("→ {:?}", state);
        self.trace.push(state);
    }

    fn recover(&mut self, err: Recovered) {
        warn!("{} (continuing)", err);
        self.recovered.push(err);
    }

    fn fail(&mut self, err: RunError) {
        error!("{}", err);
        self.fatal = Some(err.to_string());
        self.error = Some(err);
    }

    fn absorb(&mut self, sequence: SequenceReport) {
        self.trace.extend(sequence.trace);
        self.docking = sequence.docking;
        self.docking_attempts = sequence.docking_attempts;
        self.image_shown = sequence.image_shown;
        self.animations_played = sequence.animations_played;
        self.recovered.extend(sequence.recovered);
    }

    /// 0 for completion (degraded or not), otherwise the fatal error's code.
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, RunError::exit_code)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn final_state(&self) -> Option<SequencerState> {
        self.trace.last().copied()
    }
}

/// Composes measurement, lookup, sequencing and cleanup for one run.
pub struct Orchestrator<Ctx: QballContext, L: ImageLoader> {
    ctx: Arc<Ctx>,
    config: RunConfig,
    table: ResponseTable,
    measurement: MeasurementSource,
    selector: BackendSelector,
    sequencer: ActionSequencer<Ctx, L>,
}

impl<Ctx: QballContext, L: ImageLoader> Orchestrator<Ctx, L> {
    pub fn new(
        ctx: Arc<Ctx>,
        config: RunConfig,
        table: ResponseTable,
        measurement: MeasurementSource,
        selector: BackendSelector,
        loader: L,
    ) -> Self {
        let sequencer = ActionSequencer::new(
            Arc::clone(&ctx),
            loader,
            config.assets(),
            config.sequencer_config(),
        );
        Self {
            ctx,
            config,
            table,
            measurement,
            selector,
            sequencer,
        }
    }

    pub fn table(&self) -> &ResponseTable {
        &self.table
    }

    /// Runs once against `device`. Always returns a report; see `exit_code`.
    pub async fn run<D: RobotDevice>(&mut self, device: D) -> RunReport {
        let started = self.ctx.now();
        let mut report = RunReport::new(self.ctx.seed());
        info!("Run {} starting", report.run_id);
        report.enter(SequencerState::Disconnected);

        let connected = DeviceSession::connect(
            device,
            self.config.connect_timeout(),
            self.config.call_timeout(),
        )
        .await;

        match connected {
            Ok(mut session) => {
                report.enter(SequencerState::Connected);
                if let Err(fatal) = self.run_connected(&mut session, &mut report).await {
                    report.fail(fatal);
                }
                report.enter(SequencerState::Disconnecting);
                if let Err(e) = session.close().await {
                    warn!("Disconnect reported an error: {}", e);
                }
            }
            Err(e) => {
                report.fail(RunError::FatalConnect(e));
                report.enter(SequencerState::Disconnecting);
                info!("No connection was established; nothing to disconnect");
            }
        }

        report.enter(SequencerState::Disconnected);
        report.elapsed_ms = (self.ctx.now() - started).as_millis() as u64;
        report
    }

    async fn run_connected<D: RobotDevice>(
        &mut self,
        session: &mut DeviceSession<D>,
        report: &mut RunReport,
    ) -> Result<(), RunError> {
        if let Some(intro) = &self.config.intro_image {
            if let Err(skipped) = self.sequencer.show_image(intro, session).await {
                report.recover(skipped);
            }
        }

        let measurement = self.measurement.measure(self.table.qubits())?;
        info!("Measured {}", measurement);
        let entry = self.table.lookup(&measurement)?;

        report.measurement = Some(measurement.clone());
        report.sentiment = Some(entry.sentiment);
        report.phrase = Some(entry.phrase.clone());

        let sequence = self.sequencer.execute(entry, session).await;
        report.absorb(sequence);

        self.illustrate(session, report).await;
        Ok(())
    }

    /// Cosmetic extras after the answer: local histogram and remote hardware.
    async fn illustrate<D: RobotDevice>(
        &mut self,
        session: &mut DeviceSession<D>,
        report: &mut RunReport,
    ) {
        let qubits = self.table.qubits();

        if self.config.simulation_shots > 0 {
            match self.measurement.sample(qubits, self.config.simulation_shots) {
                Ok(counts) => {
                    info!("simulation ({}): {}", self.measurement.backend_name(), counts);
                    report.simulation_counts = Some(counts);
                }
                Err(e) => warn!("Illustrative simulation skipped: {}", e),
            }
        }

        report.remote = self.selector.select_remote().await;
        let backend = match &report.remote {
            RemoteSelection::Selected(backend) => backend.clone(),
            RemoteSelection::Unavailable(RemoteUnavailable::NotConfigured) => return,
            RemoteSelection::Unavailable(reason) => {
                let reason = reason.to_string();
                report.recover(Recovered::RemoteBackend(reason));
                return;
            }
        };
        if !self.config.remote_side_query {
            return;
        }

        let line = format!(
            "Hold on. I'm going to ask an {} to run the quantum program",
            friendly_name(&backend.name)
        );
        let limit = session.call_timeout();
        if let Err(e) = bounded(limit, session.device_mut().say_text(&line)).await {
            report.recover(Recovered::Speech(e.to_string()));
        }

        let circuit = superposition_circuit(qubits);
        match self
            .selector
            .side_query(&backend, &circuit, self.config.remote_shots)
            .await
        {
            Ok(counts) => {
                info!("experiment ({}): {}", backend.name, counts);
                report.remote_counts = Some(counts);
            }
            Err(e) => report.recover(Recovered::SideQuery(e.to_string())),
        }
    }
}
