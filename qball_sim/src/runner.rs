//! Scenario runner - executes one orchestrated run per scenario and checks it.

use crate::backends::{ScriptedBackend, UnavailableBackend};
use crate::context::SimContext;
use crate::images::SimImageLoader;
use crate::remote::{RemoteFault, SimRemoteProvider};
use crate::robot::{AccessoryPresence, DeviceCall, DeviceJournal, FaultPlan, JournalEntry, SimRobot};
use crate::scenarios::ScenarioId;

use qball_core::{
    BackendSelector, ConfigError, DockingOutcome, FsImageLoader, MeasurementSource, Orchestrator,
    Recovered, RemoteSelection, RemoteUnavailable, ResponseEntry, ResponseTable, RunConfig,
    RunReport, Sentiment, SequencerState, StaticProvider, TableError, DOCKING_RETRY_BOUND,
};
use qball_env::{BackendDescriptor, ImageError, ImageLoader, QballContext, ScreenImage};
use std::path::Path;
use tracing::{debug, info};

/// RNG stream for the simulated remote provider.
const REMOTE_STREAM: u64 = 0x4E3073;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// The orchestrator's own account of the run
    pub report: RunReport,

    /// Every call the robot received
    pub journal: Vec<JournalEntry>,
}

/// Image loader used for a scenario run.
enum SceneLoader {
    Sim(SimImageLoader),
    Fs(FsImageLoader),
}

impl ImageLoader for SceneLoader {
    fn load(&self, path: &Path) -> Result<ScreenImage, ImageError> {
        match self {
            SceneLoader::Sim(loader) => loader.load(path),
            SceneLoader::Fs(loader) => loader.load(path),
        }
    }
}

/// Collaborators prepared for one scenario.
struct Setup {
    /// Forced measurement; `None` samples the seeded simulator
    outcome: Option<String>,
    simulator_down: bool,
    faults: FaultPlan,
    remote_fault: RemoteFault,
    loader: SceneLoader,
}

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    config: RunConfig,
    table: ResponseTable,

    /// Backends the simulated provider lists
    listing: Vec<BackendDescriptor>,

    /// Outcome and entry the scripted scenarios force
    affirmative: (String, ResponseEntry),
    negative: String,

    /// Faults for the `random` scenario
    faults: FaultPlan,
    remote_fault: RemoteFault,

    /// Decode real images from the configured asset directory
    fs_assets: bool,
}

impl ScenarioRunner {
    /// Creates a runner; fails if the config or its response table is invalid.
    pub fn new(seed: u64, config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = config.load_table()?;

        let affirmative = table
            .iter()
            .find(|(_, e)| e.sentiment == Sentiment::Affirmative)
            .map(|(k, e)| (k.clone(), e.clone()))
            .ok_or(TableError::AffirmativeCount(0))?;
        let negative = table
            .negative_outcome()
            .map(str::to_string)
            .ok_or(TableError::NegativeCount(0))?;
        let listing = match &config.remote_backends {
            Some(path) => StaticProvider::from_json_file(path)?.backends().to_vec(),
            None => SimRemoteProvider::default_listing(),
        };

        Ok(Self {
            seed,
            config,
            table,
            listing,
            affirmative,
            negative,
            faults: FaultPlan::default(),
            remote_fault: RemoteFault::None,
            fs_assets: false,
        })
    }

    /// Sets the fault plan used by the `random` scenario.
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Sets the remote fault used by the `random` scenario.
    pub fn with_remote_fault(mut self, fault: RemoteFault) -> Self {
        self.remote_fault = fault;
        self
    }

    /// Loads images from disk instead of serving test cards.
    pub fn with_fs_assets(mut self, enabled: bool) -> Self {
        self.fs_assets = enabled;
        self
    }

    fn loader(&self) -> SceneLoader {
        if self.fs_assets {
            SceneLoader::Fs(FsImageLoader)
        } else {
            SceneLoader::Sim(SimImageLoader::new())
        }
    }

    fn setup(&self, scenario: ScenarioId) -> Setup {
        let (yes, yes_entry) = &self.affirmative;
        let mut setup = Setup {
            outcome: Some(yes.clone()),
            simulator_down: false,
            faults: FaultPlan::default(),
            remote_fault: RemoteFault::None,
            loader: self.loader(),
        };

        match scenario {
            ScenarioId::Affirmative => {}
            ScenarioId::Negative => setup.outcome = Some(self.negative.clone()),
            ScenarioId::AccessoryTimeout => setup.faults.accessory = AccessoryPresence::Hanging,
            ScenarioId::ConnectFailure => setup.faults.connect_fails = true,
            ScenarioId::DockingExhausted => setup.faults.dock_succeeds_on = None,
            ScenarioId::DecodeFailure => {
                let file = Path::new(&yes_entry.image_ref)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                setup.loader = SceneLoader::Sim(SimImageLoader::new().with_corrupt(file));
            }
            ScenarioId::MeasurementFailure => {
                setup.outcome = None;
                setup.simulator_down = true;
            }
            ScenarioId::RemoteAuthFailure => {
                setup.outcome = Some(self.negative.clone());
                setup.remote_fault = RemoteFault::Authentication;
            }
            ScenarioId::AnimationFailure => {
                setup.faults.failing_animations = yes_entry.animations.iter().take(1).cloned().collect();
            }
            ScenarioId::Random => {
                setup.outcome = None;
                setup.faults = self.faults.clone();
                setup.remote_fault = self.remote_fault;
            }
        }
        setup
    }

    /// Runs a scenario and returns the result.
    ///
    /// Device timeouts are real tokio timeouts; run under a paused clock
    /// (`start_paused`) so they elapse instantly.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("{}", scenario.description());

        let setup = self.setup(scenario);
        let ctx = SimContext::shared(self.seed);
        let measurement = if setup.simulator_down {
            MeasurementSource::new(Box::new(UnavailableBackend))
        } else if let Some(outcome) = &setup.outcome {
            MeasurementSource::new(Box::new(ScriptedBackend::new(outcome.clone())))
        } else {
            MeasurementSource::local(&*ctx)
        };
        let provider = SimRemoteProvider::new(
            self.listing.clone(),
            setup.remote_fault,
            ctx.derive_rng(REMOTE_STREAM),
        );
        let selector = BackendSelector::new(Box::new(provider), self.config.remote_timeout());

        let robot = SimRobot::new(ctx.clone(), setup.faults.clone());
        let journal = robot.journal();

        let Setup { outcome, loader, .. } = setup;
        let mut orchestrator = Orchestrator::new(
            ctx.clone(),
            self.config.clone(),
            self.table.clone(),
            measurement,
            selector,
            loader,
        );
        let report = orchestrator.run(robot).await;

        let verdict = self
            .check_common(&report, &journal)
            .and_then(|()| self.check(scenario, outcome.as_deref(), &report, &journal))
            .map_err(|e| format!("{}: {}", scenario.name(), e));

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: verdict.is_ok(),
            failure_reason: verdict.err(),
            report,
            journal: journal.entries(),
        }
    }

    /// Properties every run must have, whatever went wrong.
    fn check_common(&self, report: &RunReport, journal: &DeviceJournal) -> Result<(), String> {
        if report.trace.first() != Some(&SequencerState::Disconnected) {
            return Err(format!("trace does not start Disconnected: {:?}", report.trace));
        }
        if report.final_state() != Some(SequencerState::Disconnected) {
            return Err(format!("trace does not end Disconnected: {:?}", report.trace));
        }

        let connected = report.trace.contains(&SequencerState::Connected);
        let disconnects = journal.count(|c| *c == DeviceCall::Disconnect);
        let expected = usize::from(connected);
        if disconnects != expected {
            return Err(format!(
                "expected {} disconnect call(s), saw {}",
                expected, disconnects
            ));
        }

        let docks = journal.count(|c| matches!(c, DeviceCall::Dock { .. }));
        if docks > DOCKING_RETRY_BOUND as usize {
            return Err(format!("{} docking attempts exceed the bound", docks));
        }

        if report.is_success() {
            let measured = report
                .measurement
                .as_ref()
                .ok_or("successful run without a measurement")?;
            let entry = self
                .table
                .lookup(measured)
                .map_err(|e| format!("measured outcome not in table: {}", e))?;
            if report.phrase.as_deref() != Some(entry.phrase.as_str()) {
                return Err(format!(
                    "phrase {:?} does not match outcome {}",
                    report.phrase, measured
                ));
            }
            if !journal.spoken().contains(&entry.phrase) {
                return Err(format!("robot never said {:?}", entry.phrase));
            }
        }
        Ok(())
    }

    fn check(
        &self,
        scenario: ScenarioId,
        outcome: Option<&str>,
        report: &RunReport,
        journal: &DeviceJournal,
    ) -> Result<(), String> {
        match scenario {
            ScenarioId::ConnectFailure => {
                expect(report.exit_code() == 1, "connect failure must exit 1")?;
                expect(
                    journal.calls() == vec![DeviceCall::Connect],
                    "robot received calls after a failed connect",
                )?;
                expect(
                    report.trace
                        == vec![
                            SequencerState::Disconnected,
                            SequencerState::Disconnecting,
                            SequencerState::Disconnected,
                        ],
                    "connect failure trace",
                )
            }
            ScenarioId::MeasurementFailure => {
                expect(report.exit_code() == 2, "measurement failure must exit 2")?;
                expect(
                    journal.count(|c| matches!(c, DeviceCall::PlayAnimation { .. })) == 0,
                    "animations played without an answer",
                )?;
                expect(report.phrase.is_none(), "answer given without a measurement")
            }
            ScenarioId::Random => Ok(()),
            scripted => {
                expect(report.exit_code() == 0, "degraded run must still exit 0")?;
                let measured = report.measurement.as_ref().map(|m| m.as_str());
                expect(measured == outcome, "measurement differs from the scripted outcome")?;
                self.check_scripted(scripted, report, journal)
            }
        }
    }

    fn check_scripted(
        &self,
        scenario: ScenarioId,
        report: &RunReport,
        journal: &DeviceJournal,
    ) -> Result<(), String> {
        let calls = journal.calls();
        let recovered = |pred: fn(&Recovered) -> bool| report.recovered.iter().any(pred);
        let docks = journal.count(|c| matches!(c, DeviceCall::Dock { .. }));

        match scenario {
            ScenarioId::Affirmative => {
                expect(report.sentiment == Some(Sentiment::Affirmative), "sentiment")?;
                expect(report.docking == DockingOutcome::Docked, "cube should dock")?;
                expect(report.image_shown, "answer image not shown")?;
                expect(
                    report.trace.contains(&SequencerState::TerminalAction),
                    "terminal action skipped",
                )?;
                expect(
                    report.recovered.is_empty(),
                    "healthy run recovered errors",
                )?;
                expect(
                    report.animations_played == self.affirmative.1.animations,
                    "celebration incomplete",
                )
            }
            ScenarioId::Negative => {
                expect(report.sentiment == Some(Sentiment::Negative), "sentiment")?;
                let head = calls.iter().position(|c| {
                    matches!(c, DeviceCall::SetHeadAngle { degrees } if *degrees < 0.0)
                });
                let image = calls
                    .iter()
                    .rposition(|c| matches!(c, DeviceCall::DisplayImage { .. }));
                match (head, image) {
                    (Some(h), Some(i)) => expect(h < i, "head lowered after the image")?,
                    _ => return Err("head not lowered or image not shown".into()),
                }
                expect(
                    calls.contains(&DeviceCall::DriveOnCharger),
                    "did not return to the charger",
                )
            }
            ScenarioId::AccessoryTimeout => {
                expect(report.docking == DockingOutcome::Skipped, "docking should be skipped")?;
                expect(docks == 0, "docked without an accessory")?;
                expect(
                    recovered(|r| matches!(r, Recovered::AccessoryUnavailable(_))),
                    "accessory timeout not recorded",
                )?;
                expect(
                    report.elapsed_ms >= self.config.accessory_seek_timeout_ms,
                    "run finished before the accessory seek timed out",
                )?;
                expect(report.image_shown, "answer image not shown")
            }
            ScenarioId::DockingExhausted => {
                let bound = self.config.docking_attempts.min(DOCKING_RETRY_BOUND) as usize;
                expect(docks == bound, "docking attempts differ from the bound")?;
                expect(report.docking == DockingOutcome::Failed, "docking should fail")?;
                expect(
                    report.trace.contains(&SequencerState::CubeDockFailed),
                    "CubeDockFailed not visited",
                )?;
                expect(report.image_shown, "answer image not shown")
            }
            ScenarioId::DecodeFailure => {
                expect(!report.image_shown, "corrupt image reported as shown")?;
                expect(
                    recovered(|r| matches!(r, Recovered::Decode(_))),
                    "decode failure not recorded",
                )
            }
            ScenarioId::RemoteAuthFailure => {
                expect(
                    matches!(
                        report.remote,
                        RemoteSelection::Unavailable(RemoteUnavailable::Authentication(_))
                    ),
                    "remote selection should fail authentication",
                )?;
                expect(
                    recovered(|r| matches!(r, Recovered::RemoteBackend(_))),
                    "remote failure not recorded",
                )?;
                expect(report.remote_counts.is_none(), "side query ran without a backend")
            }
            ScenarioId::AnimationFailure => {
                expect(
                    report.animations_played.len() + 1 == self.affirmative.1.animations.len(),
                    "remaining animations did not play",
                )?;
                expect(
                    recovered(|r| matches!(r, Recovered::AnimationPlayback { .. })),
                    "animation failure not recorded",
                )
            }
            ScenarioId::ConnectFailure | ScenarioId::MeasurementFailure | ScenarioId::Random => Ok(()),
        }
    }
}

fn expect(ok: bool, what: &str) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(what.to_string())
    }
}
