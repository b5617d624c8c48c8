//! Simulated robot with fault injection.
//!
//! Every call is recorded in a shared `DeviceJournal` with its run-clock
//! timestamp, then waits out a latency drawn from a normal distribution.
//! The wait happens inside the caller's timeout, so a slow robot trips it. Faults come from a `FaultPlan`.

use async_trait::async_trait;
use qball_env::{AccessoryHandle, DeviceError, DockResult, QballContext, RobotDevice, ScreenImage};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::context::SimContext;

/// RNG stream for device latency.
const LATENCY_STREAM: u64 = 0xD3B1CE;

/// Dock result code reported for a failed attempt.
pub const DOCK_FAILURE_CODE: i32 = 3;

/// Whether the accessory answers discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryPresence {
    #[default]
    Present,
    Absent,
    /// Discovery never completes
    Hanging,
}

/// Scripted faults for one simulated robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultPlan {
    pub connect_fails: bool,
    pub undock_fails: bool,
    pub accessory: AccessoryPresence,

    /// 1-based attempt that docks; `None` never docks
    pub dock_succeeds_on: Option<u32>,

    pub speech_fails: bool,
    pub failing_animations: Vec<String>,

    /// Return-to-dock and pose-reset both fail
    pub terminal_fails: bool,

    /// `has_display_control` answers false this many times after a request
    pub display_control_lag: u32,

    pub latency_mean_ms: f64,
    pub latency_std_ms: f64,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            connect_fails: false,
            undock_fails: false,
            accessory: AccessoryPresence::Present,
            dock_succeeds_on: Some(1),
            speech_fails: false,
            failing_animations: Vec::new(),
            terminal_fails: false,
            display_control_lag: 0,
            latency_mean_ms: 40.0,
            latency_std_ms: 15.0,
        }
    }
}

/// One recorded device call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DeviceCall {
    Connect,
    Disconnect,
    DriveOffCharger,
    DriveOnCharger,
    Say { text: String },
    DisplayImage { duration_ms: u64 },
    PlayAnimation { name: String },
    SetHeadAngle { degrees: f32 },
    SetLiftHeight { height: f32 },
    DiscoverAccessory,
    ReleaseAccessory,
    Dock { attempt: u32 },
    RequestDisplayControl,
    ReleaseDisplayControl,
    HasDisplayControl,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub call: DeviceCall,
}

/// Shared, append-only log of device calls.
#[derive(Debug, Clone, Default)]
pub struct DeviceJournal(Arc<Mutex<Vec<JournalEntry>>>);

impl DeviceJournal {
    fn push(&self, at: Duration, call: DeviceCall) {
        let mut entries = self.0.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(JournalEntry {
            at_ms: at.as_millis() as u64,
            call,
        });
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.entries().into_iter().map(|e| e.call).collect()
    }

    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| pred(&e.call))
            .count()
    }

    /// Everything the robot said, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Say { text } => Some(text),
                _ => None,
            })
            .collect()
    }
}

pub struct SimRobot {
    ctx: Arc<SimContext>,
    plan: FaultPlan,
    journal: DeviceJournal,
    latency: Option<Normal<f64>>,
    rng: ChaCha8Rng,
    dock_calls: u32,
    lag_remaining: u32,
}

impl SimRobot {
    pub fn new(ctx: Arc<SimContext>, plan: FaultPlan) -> Self {
        let latency = if plan.latency_mean_ms > 0.0 {
            Normal::new(plan.latency_mean_ms, plan.latency_std_ms.max(0.0)).ok()
        } else {
            None
        };
        let rng = ctx.derive_rng(LATENCY_STREAM);
        Self {
            ctx,
            plan,
            journal: DeviceJournal::default(),
            latency,
            rng,
            dock_calls: 0,
            lag_remaining: 0,
        }
    }

    pub fn journal(&self) -> DeviceJournal {
        self.journal.clone()
    }

    /// Records the call, then waits out its simulated latency.
    async fn record(&mut self, call: DeviceCall) {
        debug!("robot <- {:?}", call);
        self.journal.push(self.ctx.now(), call);
        if let Some(normal) = &self.latency {
            let ms = normal.sample(&mut self.rng).max(0.0);
            self.ctx.sleep(Duration::from_secs_f64(ms / 1000.0)).await;
        }
    }

    fn fail_if(fails: bool, what: &str) -> Result<(), DeviceError> {
        if fails {
            Err(DeviceError::rejected(what))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RobotDevice for SimRobot {
    async fn connect(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceCall::Connect).await;
        if self.plan.connect_fails {
            return Err(DeviceError::unreachable("no robot found on the network"));
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceCall::Disconnect).await;
        Ok(())
    }

    async fn drive_off_charger(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceCall::DriveOffCharger).await;
        Self::fail_if(self.plan.undock_fails, "treads stalled leaving the charger")
    }

    async fn drive_on_charger(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceCall::DriveOnCharger).await;
        Self::fail_if(self.plan.terminal_fails, "charger not in view")
    }

    async fn say_text(&mut self, text: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::Say {
            text: text.to_string(),
        })
        .await;
        Self::fail_if(self.plan.speech_fails, "text-to-speech unavailable")
    }

    async fn display_image(&mut self, _image: &ScreenImage, duration: Duration) -> Result<(), DeviceError> {
        self.record(DeviceCall::DisplayImage {
            duration_ms: duration.as_millis() as u64,
        })
        .await;
        Ok(())
    }

    async fn play_animation(&mut self, name: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::PlayAnimation {
            name: name.to_string(),
        })
        .await;
        let fails = self.plan.failing_animations.iter().any(|a| a == name);
        Self::fail_if(fails, "animation not found")
    }

    async fn set_head_angle(&mut self, degrees: f32) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetHeadAngle { degrees }).await;
        Ok(())
    }

    async fn set_lift_height(&mut self, height: f32) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetLiftHeight { height }).await;
        Self::fail_if(self.plan.terminal_fails, "lift motor overheated")
    }

    async fn discover_accessory(&mut self) -> Result<AccessoryHandle, DeviceError> {
        self.record(DeviceCall::DiscoverAccessory).await;
        match self.plan.accessory {
            AccessoryPresence::Present => Ok(AccessoryHandle::new("sim-cube-01")),
            AccessoryPresence::Absent => Err(DeviceError::rejected("no light cube in range")),
            AccessoryPresence::Hanging => std::future::pending().await,
        }
    }

    async fn release_accessory(&mut self, _handle: &AccessoryHandle) -> Result<(), DeviceError> {
        self.record(DeviceCall::ReleaseAccessory).await;
        Ok(())
    }

    async fn dock_with_accessory(
        &mut self,
        _handle: &AccessoryHandle,
        _max_retries: u32,
    ) -> Result<DockResult, DeviceError> {
        self.dock_calls += 1;
        let attempt = self.dock_calls;
        self.record(DeviceCall::Dock { attempt }).await;
        match self.plan.dock_succeeds_on {
            Some(n) if n == attempt => Ok(DockResult::succeeded()),
            _ => Ok(DockResult::failed(DOCK_FAILURE_CODE)),
        }
    }

    async fn request_display_control(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceCall::RequestDisplayControl).await;
        self.lag_remaining = self.plan.display_control_lag;
        Ok(())
    }

    async fn release_display_control(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceCall::ReleaseDisplayControl).await;
        Ok(())
    }

    async fn has_display_control(&mut self) -> Result<bool, DeviceError> {
        self.record(DeviceCall::HasDisplayControl).await;
        if self.lag_remaining > 0 {
            self.lag_remaining -= 1;
            return Ok(false);
        }
        Ok(true)
    }
}
