//! Run context trait: the only source of time and entropy for a run.

use async_trait::async_trait;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// The central interface for time and randomness.
///
/// The orchestration engine never touches the system clock or OS entropy
/// directly, so the same run can execute against real hardware (tokio) or
/// inside the deterministic simulation harness.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, OS entropy
/// - **Simulation**: `SimContext` - paused tokio clock, ChaCha8 seeded from the master seed
#[async_trait]
pub trait QballContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: auto-advances the paused clock
    async fn sleep(&self, duration: Duration);

    /// Derives an RNG for one consumer of randomness.
    ///
    /// In simulation the stream id is mixed with the master seed so that
    /// every consumer gets an independent but reproducible sequence.
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng;

    /// Returns the context's seed (0 in production).
    fn seed(&self) -> u64;
}
