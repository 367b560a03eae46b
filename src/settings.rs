//! Tunable constants for terrain fusion.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// World-scale settings applied by [`fuse`](crate::fuse).
///
/// Neither value affects correctness, only the physical size of the mesh.
///
/// # Example
///
/// ```ignore
/// use bevy_terrain_fusion::FusionSettings;
///
/// let settings = FusionSettings::new()
///     .with_world_scale_divisor(50.0)
///     .with_elevation_scale_fraction(0.2);
/// ```
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    /// Raster pixels per world unit, applied uniformly to width and height.
    pub world_scale_divisor: f32,
    /// Maximum displacement as a fraction of the mesh's world width.
    pub elevation_scale_fraction: f32,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            world_scale_divisor: 100.0,
            elevation_scale_fraction: 0.1,
        }
    }
}

impl FusionSettings {
    /// Creates settings with defaults (`world_scale_divisor = 100.0`,
    /// `elevation_scale_fraction = 0.1`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many raster pixels map to one world unit.
    /// Clamped to a positive minimum to avoid division by zero.
    pub fn with_world_scale_divisor(mut self, divisor: f32) -> Self {
        self.world_scale_divisor = divisor.max(f32::EPSILON);
        self
    }

    /// Sets the relief height relative to the mesh width. Negative values clamp to zero.
    pub fn with_elevation_scale_fraction(mut self, fraction: f32) -> Self {
        self.elevation_scale_fraction = fraction.max(0.0);
        self
    }

    /// World-space `(width, depth)` of a `width × height` raster.
    pub fn footprint(&self, width: usize, height: usize) -> (f32, f32) {
        let divisor = self.world_scale_divisor.max(f32::EPSILON);
        (width as f32 / divisor, height as f32 / divisor)
    }

    /// Displacement of the highest sample for a raster `width` pixels wide.
    pub fn elevation_scale(&self, width: usize) -> f32 {
        self.footprint(width, 1).0 * self.elevation_scale_fraction
    }
}
