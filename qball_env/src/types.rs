//! Common value types shared by the collaborator contracts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Width of the robot's face display in pixels.
pub const SCREEN_WIDTH: u32 = 184;

/// Height of the robot's face display in pixels.
pub const SCREEN_HEIGHT: u32 = 96;

/// Handle to a linked accessory (the light cube).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryHandle {
    /// Local handle id, unique per link
    pub id: Uuid,

    /// Factory id reported by the accessory
    pub factory_id: String,
}

impl AccessoryHandle {
    /// Creates a handle for a freshly linked accessory.
    pub fn new(factory_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            factory_id: factory_id.into(),
        }
    }
}

/// Outcome of one docking maneuver as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockResult {
    /// Driver result code (0 = success)
    pub code: i32,

    /// Whether the robot ended up docked with the accessory
    pub success: bool,
}

impl DockResult {
    pub fn succeeded() -> Self {
        Self { code: 0, success: true }
    }

    pub fn failed(code: i32) -> Self {
        Self { code, success: false }
    }
}

/// Read-only snapshot of a quantum backend as enumerated by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub name: String,
    pub queued_job_count: u32,
    pub is_simulator: bool,
}

impl BackendDescriptor {
    pub fn new(name: impl Into<String>, queued_job_count: u32, is_simulator: bool) -> Self {
        Self {
            name: name.into(),
            queued_job_count,
            is_simulator,
        }
    }
}

/// Measurement histogram: bitstring -> number of shots that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts(pub BTreeMap<String, u32>);

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one shot for the given bitstring.
    pub fn record(&mut self, bitstring: impl Into<String>) {
        *self.0.entry(bitstring.into()).or_insert(0) += 1;
    }

    /// Total number of shots.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Returns the only outcome of a single-shot run.
    ///
    /// `None` unless there is exactly one key with count 1.
    pub fn single_outcome(&self) -> Option<&str> {
        match self.0.iter().next() {
            Some((key, 1)) if self.0.len() == 1 => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.0.iter()
    }
}

impl std::fmt::Display for Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, count)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", key, count)?;
        }
        write!(f, "}}")
    }
}

/// A face-display image in the robot's native RGB565 format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u16>,
}

impl ScreenImage {
    /// Packs an RGB888 buffer (row-major, 3 bytes per pixel) into RGB565.
    pub fn from_rgb8(width: u32, height: u32, rgb: &[u8]) -> Self {
        let pixels = rgb
            .chunks_exact(3)
            .map(|px| rgb565(px[0], px[1], px[2]))
            .collect();
        Self { width, height, pixels }
    }

    /// A full-screen image of one color.
    pub fn solid(r: u8, g: u8, b: u8) -> Self {
        let count = (SCREEN_WIDTH * SCREEN_HEIGHT) as usize;
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            pixels: vec![rgb565(r, g, b); count],
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_outcome_requires_one_shot() {
        let mut counts = Counts::new();
        assert_eq!(counts.single_outcome(), None);

        counts.record("101");
        assert_eq!(counts.single_outcome(), Some("101"));

        counts.record("101");
        assert_eq!(counts.single_outcome(), None);
    }

    #[test]
    fn test_counts_display_matches_histogram_format() {
        let mut counts = Counts::new();
        counts.record("0");
        counts.record("1");
        counts.record("1");
        assert_eq!(counts.to_string(), "{'0': 1, '1': 2}");
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_rgb565_packing() {
        let img = ScreenImage::from_rgb8(2, 1, &[255, 255, 255, 255, 0, 0]);
        assert_eq!(img.pixels, vec![0xFFFF, 0xF800]);
    }

    #[test]
    fn test_solid_fills_screen() {
        let img = ScreenImage::solid(0, 0, 0);
        assert_eq!(img.len(), (SCREEN_WIDTH * SCREEN_HEIGHT) as usize);
        assert!(img.pixels.iter().all(|p| *p == 0));
    }
}
