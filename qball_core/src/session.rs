//! DeviceSession - the run's exclusive, live connection to the robot.

use qball_env::{AccessoryHandle, DeviceError, RobotDevice};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Bounds a device call by `limit`; elapsing becomes `DeviceError::Timeout`.
pub async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, DeviceError>>,
) -> Result<T, DeviceError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DeviceError::timeout(limit)),
    }
}

/// A connected robot plus the transient state of this run.
///
/// Only `connect` creates one and only `close` ends it, so the device is
/// disconnected exactly once.
pub struct DeviceSession<D: RobotDevice> {
    device: D,
    call_timeout: Duration,
    display_control_held: bool,
    accessory: Option<AccessoryHandle>,
    closed: bool,
}

impl<D: RobotDevice> DeviceSession<D> {
    /// Performs the handshake. Failure here is fatal for the run.
    pub async fn connect(
        mut device: D,
        connect_timeout: Duration,
        call_timeout: Duration,
    ) -> Result<Self, DeviceError> {
        bounded(connect_timeout, device.connect()).await?;
        debug!("Device connected");
        Ok(Self {
            device,
            call_timeout,
            // The SDK grants behavior control on connect
            display_control_held: true,
            accessory: None,
            closed: false,
        })
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Per-call acknowledgment bound.
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn holds_display_control(&self) -> bool {
        self.display_control_held
    }

    pub fn set_display_control(&mut self, held: bool) {
        self.display_control_held = held;
    }

    pub fn accessory(&self) -> Option<&AccessoryHandle> {
        self.accessory.as_ref()
    }

    pub fn link_accessory(&mut self, handle: AccessoryHandle) {
        self.accessory = Some(handle);
    }

    /// Releases the accessory link, then disconnects.
    ///
    /// Consumes the session; the returned error is informational only.
    pub async fn close(mut self) -> Result<(), DeviceError> {
        let limit = self.call_timeout;
        if let Some(handle) = self.accessory.take() {
            if let Err(e) = bounded(limit, self.device.release_accessory(&handle)).await {
                warn!("Could not release accessory {}: {}", handle.factory_id, e);
            }
        }
        let result = bounded(limit, self.device.disconnect()).await;
        self.closed = true;
        self.display_control_held = false;
        debug!("Device disconnected");
        result
    }
}

impl<D: RobotDevice> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        if !self.closed {
            error!("DeviceSession dropped without close(); robot left connected");
        }
    }
}
