//! Quantum 8-Ball Environment Abstraction Layer
//!
//! This crate holds the contracts for everything the orchestration engine
//! consumes but does not implement:
//! - The robot driver (`RobotDevice`)
//! - Quantum execution (`QuantumBackend`, `RemoteProvider`)
//! - Image decoding (`ImageLoader`)
//! - Time and randomness (`QballContext`)
//!
//! Production code plugs in real collaborators; the simulation harness
//! plugs in deterministic ones with fault injection.
//!
//! # Example
//!
//! ```ignore
//! use qball_env::{QballContext, RobotDevice};
//!
//! async fn greet<Ctx: QballContext, D: RobotDevice>(ctx: &Ctx, robot: &mut D) {
//!     robot.connect().await?;
//!     robot.say_text("Hello").await?;
//!     ctx.sleep(Duration::from_secs(1)).await;
//!     robot.disconnect().await?;
//! }
//! ```

mod context;
mod device;
mod error;
mod image;
mod quantum;
mod remote;
mod tokio_impl;
mod types;

pub use context::QballContext;
pub use device::RobotDevice;
pub use error::{BackendError, DeviceError, ImageError, RemoteError};
pub use image::ImageLoader;
pub use quantum::{Circuit, Gate, QuantumBackend};
pub use remote::RemoteProvider;
pub use tokio_impl::TokioContext;
pub use types::{
    AccessoryHandle, BackendDescriptor, Counts, DockResult, ScreenImage, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
