//! In-crate fakes for unit tests.

use async_trait::async_trait;
use qball_env::{
    AccessoryHandle, DeviceError, DockResult, ImageError, ImageLoader, QballContext, RobotDevice,
    ScreenImage,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Disconnect,
    DriveOffCharger,
    DriveOnCharger,
    Say(String),
    DisplayImage,
    Animation(String),
    HeadAngle(f32),
    LiftHeight(f32),
    Discover,
    ReleaseAccessory,
    Dock { attempt: u32 },
    RequestControl,
    ReleaseControl,
    HasControl,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    pub connect_fails: bool,
    pub undock_fails: bool,
    pub accessory_hangs: bool,
    pub accessory_absent: bool,
    /// 1-based attempt that docks; `None` never docks
    pub dock_succeeds_on: Option<u32>,
    pub speech_fails: bool,
    pub failing_animations: Vec<String>,
    pub terminal_fails: bool,
    pub control_lag_polls: u32,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect_fails: false,
            undock_fails: false,
            accessory_hangs: false,
            accessory_absent: false,
            dock_succeeds_on: Some(1),
            speech_fails: false,
            failing_animations: Vec::new(),
            terminal_fails: false,
            control_lag_polls: 0,
        }
    }
}

pub struct FakeRobot {
    script: Script,
    journal: Journal,
    dock_calls: u32,
    lag_remaining: u32,
}

impl FakeRobot {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            journal: Journal::default(),
            dock_calls: 0,
            lag_remaining: 0,
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    fn fail_if(&self, fails: bool, what: &str) -> Result<(), DeviceError> {
        if fails {
            Err(DeviceError::rejected(what))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RobotDevice for FakeRobot {
    async fn connect(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Call::Connect);
        if self.script.connect_fails {
            return Err(DeviceError::unreachable("no robot on this network"));
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Call::Disconnect);
        Ok(())
    }

    async fn drive_off_charger(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Call::DriveOffCharger);
        self.fail_if(self.script.undock_fails, "wheels stuck")
    }

    async fn drive_on_charger(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Call::DriveOnCharger);
        self.fail_if(self.script.terminal_fails, "charger not found")
    }

    async fn say_text(&mut self, text: &str) -> Result<(), DeviceError> {
        self.journal.push(Call::Say(text.to_string()));
        self.fail_if(self.script.speech_fails, "tts busy")
    }

    async fn display_image(&mut self, _image: &ScreenImage, _duration: Duration) -> Result<(), DeviceError> {
        self.journal.push(Call::DisplayImage);
        Ok(())
    }

    async fn play_animation(&mut self, name: &str) -> Result<(), DeviceError> {
        self.journal.push(Call::Animation(name.to_string()));
        let fails = self.script.failing_animations.iter().any(|a| a == name);
        self.fail_if(fails, "animation not found")
    }

    async fn set_head_angle(&mut self, degrees: f32) -> Result<(), DeviceError> {
        self.journal.push(Call::HeadAngle(degrees));
        self.fail_if(self.script.terminal_fails && degrees > 0.0, "head motor")
    }

    async fn set_lift_height(&mut self, height: f32) -> Result<(), DeviceError> {
        self.journal.push(Call::LiftHeight(height));
        Ok(())
    }

    async fn discover_accessory(&mut self) -> Result<AccessoryHandle, DeviceError> {
        self.journal.push(Call::Discover);
        if self.script.accessory_hangs {
            return std::future::pending().await;
        }
        if self.script.accessory_absent {
            return Err(DeviceError::rejected("no cube in range"));
        }
        Ok(AccessoryHandle::new("cube-fake"))
    }

    async fn release_accessory(&mut self, _handle: &AccessoryHandle) -> Result<(), DeviceError> {
        self.journal.push(Call::ReleaseAccessory);
        Ok(())
    }

    async fn dock_with_accessory(
        &mut self,
        _handle: &AccessoryHandle,
        _max_retries: u32,
    ) -> Result<DockResult, DeviceError> {
        self.dock_calls += 1;
        self.journal.push(Call::Dock {
            attempt: self.dock_calls,
        });
        match self.script.dock_succeeds_on {
            Some(n) if n == self.dock_calls => Ok(DockResult::succeeded()),
            _ => Ok(DockResult::failed(3)),
        }
    }

    async fn request_display_control(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Call::RequestControl);
        self.lag_remaining = self.script.control_lag_polls;
        Ok(())
    }

    async fn release_display_control(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Call::ReleaseControl);
        Ok(())
    }

    async fn has_display_control(&mut self) -> Result<bool, DeviceError> {
        self.journal.push(Call::HasControl);
        if self.lag_remaining > 0 {
            self.lag_remaining -= 1;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Image loader keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct FakeLoader {
    missing: Vec<String>,
    corrupt: Vec<String>,
}

impl FakeLoader {
    pub fn missing(keys: &[&str]) -> Self {
        Self {
            missing: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn corrupt(keys: &[&str]) -> Self {
        Self {
            corrupt: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl ImageLoader for FakeLoader {
    fn load(&self, path: &Path) -> Result<ScreenImage, ImageError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.missing.contains(&name) {
            return Err(ImageError::Missing(name));
        }
        if self.corrupt.contains(&name) {
            return Err(ImageError::Decode(name));
        }
        Ok(ScreenImage::solid(0, 0, 255))
    }
}

/// Context whose sleeps return immediately and are only tallied.
#[derive(Debug, Default)]
pub struct StillContext {
    slept: Mutex<Duration>,
}

impl StillContext {
    pub fn slept(&self) -> Duration {
        *self.slept.lock().unwrap()
    }
}

#[async_trait]
impl QballContext for StillContext {
    fn now(&self) -> Duration {
        self.slept()
    }

    async fn sleep(&self, duration: Duration) {
        *self.slept.lock().unwrap() += duration;
    }

    fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(stream)
    }

    fn seed(&self) -> u64 {
        0
    }
}
