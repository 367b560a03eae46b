//! The terrain fusion pipeline: validate, displace, texture.

use bevy::prelude::*;

use crate::error::FusionError;
use crate::mesher::{TerrainMesh, TerrainMeshBuilder};
use crate::raster::Raster;
use crate::settings::FusionSettings;
use crate::texture::{Rotation, TextureBuffer, pack_texture};

/// A mesh and its matching texture, ready to hand to a presenter.
///
/// Mesh vertex `j` and texture pixel `j` refer to the same raster position
/// (before rotation is applied to the texture read index).
#[derive(Debug, Clone, PartialEq)]
pub struct FusedTerrain {
    pub mesh: TerrainMesh,
    pub texture: TextureBuffer,
    pub rotation: Rotation,
}

/// Append-only sequence of human-readable status messages.
///
/// Every entry is also emitted at `info` level through Bevy's log facade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusionLog {
    entries: Vec<String>,
}

impl FusionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` and logs it at `info` level.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.entries.push(message);
    }

    /// All messages, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of messages recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends entries recorded elsewhere (e.g. on a worker task) without re-logging them.
    pub fn append(&mut self, other: FusionLog) {
        self.entries.extend(other.entries);
    }
}

/// Fuses an elevation raster and a color raster into a [`FusedTerrain`].
///
/// # Errors
///
/// - [`FusionError::DimensionMismatch`] if the rasters differ in width or
///   height. Checked before any mesh work.
/// - [`FusionError::InvalidElevationData`] if the elevation raster has no
///   finite sample.
/// - [`FusionError::Stage`] if a band the pipeline needs is missing.
pub fn fuse(
    elevation: &Raster,
    color: &Raster,
    rotation: Rotation,
    settings: &FusionSettings,
) -> Result<FusedTerrain, FusionError> {
    fuse_logged(elevation, color, rotation, settings, &mut FusionLog::new())
}

/// [`fuse`], recording each stage transition in `log`.
pub fn fuse_logged(
    elevation: &Raster,
    color: &Raster,
    rotation: Rotation,
    settings: &FusionSettings,
    log: &mut FusionLog,
) -> Result<FusedTerrain, FusionError> {
    if elevation.dimensions() != color.dimensions() {
        return Err(FusionError::DimensionMismatch {
            elevation: elevation.dimensions(),
            color: color.dimensions(),
        });
    }

    let (width, height) = elevation.dimensions();
    log.record(format!("Building {width}×{height} terrain mesh"));
    let mesh = TerrainMeshBuilder::new(*settings).build(elevation)?;

    log.record(format!("Packing texture at {}°", rotation.degrees()));
    let texture = pack_texture(color, rotation)?;

    log.record(format!(
        "Terrain ready: {} vertices, {} texture bytes",
        mesh.vertex_count(),
        texture.rgba().len()
    ));
    Ok(FusedTerrain {
        mesh,
        texture,
        rotation,
    })
}
