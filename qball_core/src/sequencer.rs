//! ActionSequencer - drives the robot through one response.
//!
//! # State machine
//!
//! ```text
//! Connected → Undocked → CubeSeeking ─┬─→ CubeDocking ─┬─→ CubeDocked ────┐
//!                                     │                └─→ CubeDockFailed ┤
//!                                     └──(timeout / no cube)──────────────┤
//!                                                                         ▼
//!            ImageDisplay → AnswerAnnounce → AnimationPlayback → [TerminalAction]
//! ```
//!
//! Every step catches its own failure and records it as a `Recovered`
//! value; nothing in here can abort the run. Connect and disconnect belong
//! to the caller's `DeviceSession`.

use qball_env::{AccessoryHandle, ImageError, ImageLoader, QballContext, RobotDevice};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::assets::AssetCatalog;
use crate::error::Recovered;
use crate::response_table::{ResponseEntry, TerminalAction};
use crate::session::{bounded, DeviceSession};

/// Maximum docking maneuvers before giving up on the cube.
pub const DOCKING_RETRY_BOUND: u32 = 4;

/// Result code recorded when a docking call errors instead of returning.
pub const DOCK_CODE_DEVICE_ERROR: i32 = -1;

/// Run states, in the order a complete run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SequencerState {
    Disconnected,
    Connected,
    Undocked,
    CubeSeeking,
    CubeDocking,
    CubeDocked,
    CubeDockFailed,
    ImageDisplay,
    AnswerAnnounce,
    AnimationPlayback,
    TerminalAction,
    Disconnecting,
}

/// How display control is taken back from the robot's own behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DisplayHandoff {
    /// Release, wait a fixed interval, request again.
    SettleDelay { settle_ms: u64 },
    /// Release, request, then poll the driver's acknowledgment.
    PollUntilAcquired { interval_ms: u64, max_polls: u32 },
}

impl Default for DisplayHandoff {
    fn default() -> Self {
        DisplayHandoff::SettleDelay { settle_ms: 1000 }
    }
}

/// Tunables for one sequence.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// How long to wait for the cube to link
    pub accessory_seek_timeout: Duration,

    /// Docking maneuvers before CubeDockFailed (at most `DOCKING_RETRY_BOUND`)
    pub docking_attempts: u32,

    pub handoff: DisplayHandoff,

    /// How long an image stays on the face
    pub display_duration: Duration,

    /// Spoken before every answer
    pub preamble: Option<String>,

    /// Head angle for `TerminalAction::PoseReset`
    pub pose_reset_head_deg: f32,

    /// Lift height for `TerminalAction::PoseReset`
    pub pose_reset_lift: f32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            accessory_seek_timeout: Duration::from_secs(5),
            docking_attempts: DOCKING_RETRY_BOUND,
            handoff: DisplayHandoff::default(),
            display_duration: Duration::from_secs(10),
            preamble: Some("The Quantum 8-ball says, ".to_string()),
            pose_reset_head_deg: 45.0,
            pose_reset_lift: 0.0,
        }
    }
}

/// One docking maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DockingAttempt {
    /// 1-based
    pub attempt_index: u32,
    pub result_code: i32,
    pub success: bool,
}

/// How the cube phase resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DockingOutcome {
    /// No cube linked; docking never attempted
    #[default]
    Skipped,
    Docked,
    Failed,
}

/// Everything a sequence did, including what it skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SequenceReport {
    pub trace: Vec<SequencerState>,
    pub docking: DockingOutcome,
    pub docking_attempts: Vec<DockingAttempt>,
    pub image_shown: bool,
    pub animations_played: Vec<String>,
    pub recovered: Vec<Recovered>,
}

impl SequenceReport {
    fn enter(&mut self, state: SequencerState) {
        info!("→ {:?}", state);
        self.trace.push(state);
    }

    fn recover(&mut self, err: Recovered) {
        warn!("{} (continuing)", err);
        self.recovered.push(err);
    }
}

/// Executes resolved responses against a device session.
pub struct ActionSequencer<Ctx: QballContext, L: ImageLoader> {
    ctx: Arc<Ctx>,
    loader: L,
    assets: AssetCatalog,
    config: SequencerConfig,
}

impl<Ctx: QballContext, L: ImageLoader> ActionSequencer<Ctx, L> {
    pub fn new(ctx: Arc<Ctx>, loader: L, assets: AssetCatalog, config: SequencerConfig) -> Self {
        Self {
            ctx,
            loader,
            assets,
            config,
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Runs the full sequence for `entry`. Never fails; see the report.
    pub async fn execute<D: RobotDevice>(
        &self,
        entry: &ResponseEntry,
        session: &mut DeviceSession<D>,
    ) -> SequenceReport {
        let mut report = SequenceReport::default();

        self.undock(session, &mut report).await;
        self.seek_and_dock(session, &mut report).await;
        self.display_answer_image(entry, session, &mut report).await;
        self.announce(entry, session, &mut report).await;
        self.play_animations(entry, session, &mut report).await;
        if let Some(action) = entry.terminal_action {
            self.terminal_action(action, session, &mut report).await;
        }

        report
    }

    async fn undock<D: RobotDevice>(&self, session: &mut DeviceSession<D>, report: &mut SequenceReport) {
        report.enter(SequencerState::Undocked);
        let limit = session.call_timeout();
        if let Err(e) = bounded(limit, session.device_mut().drive_off_charger()).await {
            // Treated as already off the charger
            report.recover(Recovered::Undock(e.to_string()));
        }
    }

    async fn seek_and_dock<D: RobotDevice>(
        &self,
        session: &mut DeviceSession<D>,
        report: &mut SequenceReport,
    ) {
        report.enter(SequencerState::CubeSeeking);
        let seek = bounded(
            self.config.accessory_seek_timeout,
            session.device_mut().discover_accessory(),
        )
        .await;

        let handle = match seek {
            Ok(handle) => handle,
            Err(e) => {
                report.recover(Recovered::AccessoryUnavailable(e.to_string()));
                return;
            }
        };
        info!("Linked accessory {}", handle.factory_id);
        session.link_accessory(handle.clone());

        report.enter(SequencerState::CubeDocking);
        let (outcome, attempts) = self.dock(&handle, session).await;
        report.docking = outcome;
        report.docking_attempts = attempts;

        match outcome {
            DockingOutcome::Docked => report.enter(SequencerState::CubeDocked),
            _ => {
                report.enter(SequencerState::CubeDockFailed);
                report.recover(Recovered::DockingFailed {
                    attempts: report.docking_attempts.len() as u32,
                });
            }
        }
    }

    /// Bounded docking loop; the attempt counter lives here, not in the driver.
    async fn dock<D: RobotDevice>(
        &self,
        handle: &AccessoryHandle,
        session: &mut DeviceSession<D>,
    ) -> (DockingOutcome, Vec<DockingAttempt>) {
        let bound = self.config.docking_attempts.min(DOCKING_RETRY_BOUND);
        let limit = session.call_timeout();
        let mut attempts = Vec::with_capacity(bound as usize);

        for attempt_index in 1..=bound {
            let attempt = match bounded(limit, session.device_mut().dock_with_accessory(handle, 0)).await {
                Ok(result) => DockingAttempt {
                    attempt_index,
                    result_code: result.code,
                    success: result.success,
                },
                Err(e) => {
                    debug!("Docking attempt {} errored: {}", attempt_index, e);
                    DockingAttempt {
                        attempt_index,
                        result_code: DOCK_CODE_DEVICE_ERROR,
                        success: false,
                    }
                }
            };
            debug!(
                "Docking attempt {}/{}: code={} success={}",
                attempt_index, bound, attempt.result_code, attempt.success
            );
            attempts.push(attempt);

            if attempt.success {
                return (DockingOutcome::Docked, attempts);
            }
        }

        (DockingOutcome::Failed, attempts)
    }

    async fn display_answer_image<D: RobotDevice>(
        &self,
        entry: &ResponseEntry,
        session: &mut DeviceSession<D>,
        report: &mut SequenceReport,
    ) {
        report.enter(SequencerState::ImageDisplay);

        if let Some(angle) = entry.head_angle_deg {
            let limit = session.call_timeout();
            if let Err(e) = bounded(limit, session.device_mut().set_head_angle(angle)).await {
                report.recover(Recovered::Pose(e.to_string()));
            }
        }

        match self.show_image(&entry.image_ref, session).await {
            Ok(()) => report.image_shown = true,
            Err(skipped) => report.recover(skipped),
        }
    }

    /// Loads an asset and pushes it to the face.
    ///
    /// Returns the reason the image was skipped, if it was.
    pub async fn show_image<D: RobotDevice>(
        &self,
        image_ref: &str,
        session: &mut DeviceSession<D>,
    ) -> Result<(), Recovered> {
        let path = self.assets.resolve(image_ref);
        let image = self.loader.load(&path).map_err(|e| match e {
            ImageError::Missing(m) => Recovered::AssetMissing(m),
            ImageError::Decode(m) => Recovered::Decode(m),
        })?;

        self.acquire_display_control(session).await?;

        info!("Display image {} on the robot's face", image_ref);
        let limit = session.call_timeout();
        bounded(
            limit,
            session
                .device_mut()
                .display_image(&image, self.config.display_duration),
        )
        .await
        .map_err(|e| Recovered::Display(e.to_string()))
    }

    /// Hands display control back to the robot, then takes it again.
    async fn acquire_display_control<D: RobotDevice>(
        &self,
        session: &mut DeviceSession<D>,
    ) -> Result<(), Recovered> {
        let limit = session.call_timeout();
        let failed = |e: qball_env::DeviceError| Recovered::DisplayControl(e.to_string());

        if let Err(e) = bounded(limit, session.device_mut().release_display_control()).await {
            debug!("Release of display control failed: {}", e);
        }
        session.set_display_control(false);

        match self.config.handoff {
            DisplayHandoff::SettleDelay { settle_ms } => {
                self.ctx.sleep(Duration::from_millis(settle_ms)).await;
                bounded(limit, session.device_mut().request_display_control())
                    .await
                    .map_err(failed)?;
            }
            DisplayHandoff::PollUntilAcquired {
                interval_ms,
                max_polls,
            } => {
                bounded(limit, session.device_mut().request_display_control())
                    .await
                    .map_err(failed)?;
                let mut polls = 0;
                while !bounded(limit, session.device_mut().has_display_control())
                    .await
                    .map_err(failed)?
                {
                    polls += 1;
                    if polls >= max_polls {
                        return Err(Recovered::DisplayControl(format!(
                            "not acknowledged after {} polls",
                            polls
                        )));
                    }
                    self.ctx.sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }

        session.set_display_control(true);
        Ok(())
    }

    async fn announce<D: RobotDevice>(
        &self,
        entry: &ResponseEntry,
        session: &mut DeviceSession<D>,
        report: &mut SequenceReport,
    ) {
        report.enter(SequencerState::AnswerAnnounce);
        info!("The Quantum 8-ball says: {}", entry.phrase);

        let limit = session.call_timeout();
        let lines = self.config.preamble.iter().chain(std::iter::once(&entry.phrase));
        for line in lines {
            if let Err(e) = bounded(limit, session.device_mut().say_text(line)).await {
                report.recover(Recovered::Speech(e.to_string()));
            }
        }
    }

    async fn play_animations<D: RobotDevice>(
        &self,
        entry: &ResponseEntry,
        session: &mut DeviceSession<D>,
        report: &mut SequenceReport,
    ) {
        report.enter(SequencerState::AnimationPlayback);
        let limit = session.call_timeout();

        for name in &entry.animations {
            match bounded(limit, session.device_mut().play_animation(name)).await {
                Ok(()) => report.animations_played.push(name.clone()),
                Err(e) => report.recover(Recovered::AnimationPlayback {
                    name: name.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }

    async fn terminal_action<D: RobotDevice>(
        &self,
        action: TerminalAction,
        session: &mut DeviceSession<D>,
        report: &mut SequenceReport,
    ) {
        report.enter(SequencerState::TerminalAction);
        let limit = session.call_timeout();

        let result = match action {
            TerminalAction::ReturnToDock => {
                info!("Returning to the charger");
                bounded(limit, session.device_mut().drive_on_charger()).await
            }
            TerminalAction::PoseReset => {
                match bounded(
                    limit,
                    session
                        .device_mut()
                        .set_head_angle(self.config.pose_reset_head_deg),
                )
                .await
                {
                    Ok(()) => {
                        bounded(
                            limit,
                            session
                                .device_mut()
                                .set_lift_height(self.config.pose_reset_lift),
                        )
                        .await
                    }
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = result {
            report.recover(Recovered::TerminalAction(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response_table::{ResponseTable, Sentiment};
    use crate::testing::{Call, FakeRobot, FakeLoader, Script, StillContext};

    fn sequencer(loader: FakeLoader, config: SequencerConfig) -> ActionSequencer<StillContext, FakeLoader> {
        ActionSequencer::new(
            Arc::new(StillContext::default()),
            loader,
            AssetCatalog::new("assets"),
            config,
        )
    }

    fn entry(sentiment: Sentiment) -> ResponseEntry {
        ResponseTable::yes_no()
            .iter()
            .map(|(_, e)| e.clone())
            .find(|e| e.sentiment == sentiment)
            .unwrap()
    }

    async fn session(script: Script) -> (DeviceSession<FakeRobot>, crate::testing::Journal) {
        let robot = FakeRobot::new(script);
        let journal = robot.journal();
        let session = DeviceSession::connect(robot, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap();
        (session, journal)
    }

    #[tokio::test]
    async fn test_affirmative_happy_path() {
        let (mut session, journal) = session(Script::default()).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Affirmative), &mut session).await;
        session.close().await.unwrap();

        use SequencerState::*;
        assert_eq!(
            report.trace,
            vec![
                Undocked,
                CubeSeeking,
                CubeDocking,
                CubeDocked,
                ImageDisplay,
                AnswerAnnounce,
                AnimationPlayback,
                TerminalAction
            ]
        );
        assert!(report.recovered.is_empty());
        assert!(report.image_shown);
        assert_eq!(report.animations_played.len(), 3);
        assert_eq!(journal.count(|c| matches!(c, Call::DriveOnCharger)), 1);
        assert_eq!(journal.count(|c| matches!(c, Call::Disconnect)), 1);
    }

    #[tokio::test]
    async fn test_docking_exhaustion_stops_at_bound() {
        let script = Script {
            dock_succeeds_on: None,
            ..Script::default()
        };
        let (mut session, journal) = session(script).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Affirmative), &mut session).await;
        session.close().await.unwrap();

        assert_eq!(report.docking, DockingOutcome::Failed);
        assert_eq!(report.docking_attempts.len(), DOCKING_RETRY_BOUND as usize);
        assert_eq!(
            journal.count(|c| matches!(c, Call::Dock { .. })),
            DOCKING_RETRY_BOUND as usize
        );
        assert!(report.trace.contains(&SequencerState::CubeDockFailed));
        assert!(report.trace.contains(&SequencerState::ImageDisplay));
        assert!(report
            .recovered
            .contains(&Recovered::DockingFailed { attempts: 4 }));
    }

    #[tokio::test]
    async fn test_docking_succeeds_on_third_attempt() {
        let script = Script {
            dock_succeeds_on: Some(3),
            ..Script::default()
        };
        let (mut session, _journal) = session(script).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Negative), &mut session).await;
        session.close().await.unwrap();

        assert_eq!(report.docking, DockingOutcome::Docked);
        let indices: Vec<_> = report.docking_attempts.iter().map(|a| a.attempt_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(report.docking_attempts[2].success);
    }

    #[tokio::test]
    async fn test_docking_bound_cannot_be_raised() {
        let script = Script {
            dock_succeeds_on: None,
            ..Script::default()
        };
        let (mut session, _journal) = session(script).await;
        let config = SequencerConfig {
            docking_attempts: 10,
            ..SequencerConfig::default()
        };
        let report = sequencer(FakeLoader::default(), config)
            .execute(&entry(Sentiment::Affirmative), &mut session)
            .await;
        session.close().await.unwrap();

        assert_eq!(report.docking_attempts.len(), DOCKING_RETRY_BOUND as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accessory_timeout_skips_docking() {
        let script = Script {
            accessory_hangs: true,
            ..Script::default()
        };
        let (mut session, journal) = session(script).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Affirmative), &mut session).await;
        session.close().await.unwrap();

        assert!(!report.trace.contains(&SequencerState::CubeDocking));
        assert_eq!(report.docking, DockingOutcome::Skipped);
        assert!(report.image_shown);
        assert_eq!(journal.count(|c| matches!(c, Call::Dock { .. })), 0);
        assert!(matches!(
            report.recovered[0],
            Recovered::AccessoryUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_absent_accessory_skips_docking() {
        let script = Script {
            accessory_absent: true,
            ..Script::default()
        };
        let (mut session, journal) = session(script).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Negative), &mut session).await;
        session.close().await.unwrap();

        assert_eq!(report.docking, DockingOutcome::Skipped);
        assert!(report.docking_attempts.is_empty());
        assert_eq!(journal.count(|c| matches!(c, Call::Dock { .. })), 0);
        assert_eq!(journal.count(|c| matches!(c, Call::ReleaseAccessory)), 0);
        assert!(report.image_shown);
    }

    #[tokio::test]
    async fn test_decode_failure_skips_image_only() {
        let (mut session, journal) = session(Script::default()).await;
        let loader = FakeLoader::corrupt(&["ket-1.png"]);
        let seq = sequencer(loader, SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Affirmative), &mut session).await;
        session.close().await.unwrap();

        assert!(!report.image_shown);
        assert!(matches!(report.recovered[0], Recovered::Decode(_)));
        assert_eq!(journal.count(|c| matches!(c, Call::DisplayImage)), 0);
        assert_eq!(report.animations_played.len(), 3);
        assert_eq!(report.trace.last(), Some(&SequencerState::TerminalAction));
    }

    #[tokio::test]
    async fn test_failed_animation_is_skipped_in_order() {
        let script = Script {
            failing_animations: vec!["anim_eyecontact_giggle_01_head_angle_40".into()],
            ..Script::default()
        };
        let (mut session, journal) = session(script).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Affirmative), &mut session).await;
        session.close().await.unwrap();

        assert_eq!(
            report.animations_played,
            vec!["anim_pounce_success_02", "anim_fistbump_success_01"]
        );
        let attempted: Vec<_> = journal
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Animation(name) => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(attempted.len(), 3);
        assert_eq!(attempted[1], "anim_eyecontact_giggle_01_head_angle_40");
    }

    #[tokio::test]
    async fn test_settle_handoff_order() {
        let (mut session, journal) = session(Script::default()).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        seq.show_image("ket-0.png", &mut session).await.unwrap();
        session.close().await.unwrap();

        let display_calls: Vec<_> = journal
            .calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::ReleaseControl | Call::RequestControl | Call::DisplayImage
                )
            })
            .collect();
        assert_eq!(
            display_calls,
            vec![Call::ReleaseControl, Call::RequestControl, Call::DisplayImage]
        );
        assert_eq!(seq.ctx.slept(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_poll_handoff_waits_for_ack() {
        let script = Script {
            control_lag_polls: 2,
            ..Script::default()
        };
        let (mut session, journal) = session(script).await;
        let config = SequencerConfig {
            handoff: DisplayHandoff::PollUntilAcquired {
                interval_ms: 50,
                max_polls: 5,
            },
            ..SequencerConfig::default()
        };
        let seq = sequencer(FakeLoader::default(), config);

        seq.show_image("ket-0.png", &mut session).await.unwrap();
        assert!(session.holds_display_control());
        session.close().await.unwrap();

        assert_eq!(journal.count(|c| matches!(c, Call::HasControl)), 3);
        assert_eq!(seq.ctx.slept(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_poll_handoff_gives_up() {
        let script = Script {
            control_lag_polls: 10,
            ..Script::default()
        };
        let (mut session, journal) = session(script).await;
        let config = SequencerConfig {
            handoff: DisplayHandoff::PollUntilAcquired {
                interval_ms: 50,
                max_polls: 3,
            },
            ..SequencerConfig::default()
        };
        let seq = sequencer(FakeLoader::default(), config);

        let skipped = seq.show_image("ket-0.png", &mut session).await.unwrap_err();
        session.close().await.unwrap();

        assert!(matches!(skipped, Recovered::DisplayControl(_)));
        assert_eq!(journal.count(|c| matches!(c, Call::DisplayImage)), 0);
    }

    #[tokio::test]
    async fn test_negative_lowers_head_before_image() {
        let (mut session, journal) = session(Script::default()).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());

        seq.execute(&entry(Sentiment::Negative), &mut session).await;
        session.close().await.unwrap();

        let calls = journal.calls();
        let head = calls
            .iter()
            .position(|c| matches!(c, Call::HeadAngle(a) if *a < 0.0))
            .unwrap();
        let image = calls.iter().position(|c| *c == Call::DisplayImage).unwrap();
        assert!(head < image);
    }

    #[tokio::test]
    async fn test_pose_reset_terminal_action() {
        let (mut session, journal) = session(Script::default()).await;
        let seq = sequencer(FakeLoader::default(), SequencerConfig::default());
        let mut e = entry(Sentiment::Affirmative);
        e.terminal_action = Some(TerminalAction::PoseReset);

        seq.execute(&e, &mut session).await;
        session.close().await.unwrap();

        let calls = journal.calls();
        assert!(calls.contains(&Call::HeadAngle(45.0)));
        assert!(calls.contains(&Call::LiftHeight(0.0)));
        assert!(!calls.contains(&Call::DriveOnCharger));
    }

    #[tokio::test]
    async fn test_every_step_failing_still_completes() {
        let script = Script {
            undock_fails: true,
            speech_fails: true,
            terminal_fails: true,
            dock_succeeds_on: None,
            failing_animations: vec!["anim_feedback_meanwords_01".into()],
            ..Script::default()
        };
        let (mut session, _journal) = session(script).await;
        let seq = sequencer(FakeLoader::missing(&["ket-0.png"]), SequencerConfig::default());

        let report = seq.execute(&entry(Sentiment::Negative), &mut session).await;
        session.close().await.unwrap();

        assert_eq!(report.trace.last(), Some(&SequencerState::TerminalAction));
        assert!(report.recovered.iter().any(|r| matches!(r, Recovered::Undock(_))));
        assert!(report.recovered.iter().any(|r| matches!(r, Recovered::AssetMissing(_))));
        assert!(report.recovered.iter().any(|r| matches!(r, Recovered::Speech(_))));
        assert!(report
            .recovered
            .iter()
            .any(|r| matches!(r, Recovered::TerminalAction(_))));
    }
}
