//! Robot driver contract.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::DeviceError;
use crate::types::{AccessoryHandle, DockResult, ScreenImage};

/// Abstraction over the physical robot's SDK connection.
///
/// Every call blocks until the robot acknowledges. Callers bound each call
/// with their own timeout; implementations must not retry on their own
/// unless asked to through `max_retries`.
///
/// # Display control
///
/// The face display is a single-writer resource shared with the robot's
/// autonomous behavior. `release_display_control` hands it back,
/// `request_display_control` asks for it, and `has_display_control` is the
/// acknowledgment that the request has taken effect.
#[async_trait]
pub trait RobotDevice: Send {
    /// Opens the SDK connection (handshake).
    async fn connect(&mut self) -> Result<(), DeviceError>;

    /// Closes the SDK connection.
    async fn disconnect(&mut self) -> Result<(), DeviceError>;

    /// Leaves the charging base, if on it.
    async fn drive_off_charger(&mut self) -> Result<(), DeviceError>;

    /// Returns to the charging base.
    async fn drive_on_charger(&mut self) -> Result<(), DeviceError>;

    async fn say_text(&mut self, text: &str) -> Result<(), DeviceError>;

    /// Shows an image on the face for `duration`, interrupting anything
    /// currently on screen.
    async fn display_image(&mut self, image: &ScreenImage, duration: Duration) -> Result<(), DeviceError>;

    /// Plays one named animation to completion.
    async fn play_animation(&mut self, name: &str) -> Result<(), DeviceError>;

    async fn set_head_angle(&mut self, degrees: f32) -> Result<(), DeviceError>;

    /// Lift height as a fraction of its range (0.0 = down, 1.0 = up).
    async fn set_lift_height(&mut self, height: f32) -> Result<(), DeviceError>;

    /// Establishes a link to the accessory cube, waiting as long as it takes.
    async fn discover_accessory(&mut self) -> Result<AccessoryHandle, DeviceError>;

    async fn release_accessory(&mut self, handle: &AccessoryHandle) -> Result<(), DeviceError>;

    /// Performs one docking maneuver (plus `max_retries` driver-side retries).
    async fn dock_with_accessory(
        &mut self,
        handle: &AccessoryHandle,
        max_retries: u32,
    ) -> Result<DockResult, DeviceError>;

    async fn request_display_control(&mut self) -> Result<(), DeviceError>;

    async fn release_display_control(&mut self) -> Result<(), DeviceError>;

    /// Acknowledges whether this session currently owns the display.
    async fn has_display_control(&mut self) -> Result<bool, DeviceError>;
}
