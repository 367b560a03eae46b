//! Per-session fusion state: rotation, last good rasters and the status log.
//!
//! Work is split into a [`FusionJob`] (owned, `Send`, runnable on any thread)
//! and [`FusionSession::commit`], so the same session drives both the
//! synchronous API and the Bevy task-pool path in [`plugin`](crate::plugin).

use std::sync::Arc;

use bevy::prelude::*;

use crate::decoder::decode;
use crate::error::{FusionError, RasterRole};
use crate::fusion::{FusedTerrain, FusionLog, fuse_logged};
use crate::raster::Raster;
use crate::settings::FusionSettings;
use crate::texture::Rotation;

/// What a [`FusionJob`] starts from.
#[derive(Debug, Clone)]
pub enum FusionInput {
    /// Undecoded file contents; decoded as part of the job.
    Bytes { elevation: Vec<u8>, color: Vec<u8> },
    /// Rasters that already passed through a successful fusion.
    Rasters {
        elevation: Arc<Raster>,
        color: Arc<Raster>,
    },
}

/// One self-contained decode + fuse attempt.
#[derive(Debug, Clone)]
pub struct FusionJob {
    input: FusionInput,
    rotation: Rotation,
    settings: FusionSettings,
}

/// Result of running a [`FusionJob`], to be passed to [`FusionSession::commit`].
#[derive(Debug)]
pub struct FusionOutcome {
    result: Result<(Arc<Raster>, Arc<Raster>, FusedTerrain), FusionError>,
    log: FusionLog,
}

impl FusionJob {
    /// Creates a job that fuses `input` at `rotation`.
    pub fn new(input: FusionInput, rotation: Rotation, settings: FusionSettings) -> Self {
        Self {
            input,
            rotation,
            settings,
        }
    }

    /// Rotation the job will apply to the texture.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Runs decode (if needed) and fusion to completion.
    pub fn run(self) -> FusionOutcome {
        let mut log = FusionLog::new();
        let result = self.execute(&mut log);
        FusionOutcome { result, log }
    }

    fn execute(
        self,
        log: &mut FusionLog,
    ) -> Result<(Arc<Raster>, Arc<Raster>, FusedTerrain), FusionError> {
        let (elevation, color) = match self.input {
            FusionInput::Bytes { elevation, color } => {
                log.record(format!("Decoding elevation raster ({} bytes)", elevation.len()));
                let elevation = decode(&elevation).map_err(|source| FusionError::Decode {
                    which: RasterRole::Elevation,
                    source,
                })?;
                log.record(format!("Decoding color raster ({} bytes)", color.len()));
                let color = decode(&color).map_err(|source| FusionError::Decode {
                    which: RasterRole::Color,
                    source,
                })?;
                (Arc::new(elevation), Arc::new(color))
            }
            FusionInput::Rasters { elevation, color } => (elevation, color),
        };

        let terrain = fuse_logged(&elevation, &color, self.rotation, &self.settings, log)?;
        Ok((elevation, color, terrain))
    }
}

/// Explicit session context replacing process-wide rotation and raster state.
///
/// Rasters and the displayed terrain are only replaced after a fully
/// successful fusion; a failed attempt leaves the last good pair in place.
///
/// # Example
///
/// ```ignore
/// use bevy_terrain_fusion::FusionSession;
///
/// let mut session = FusionSession::default();
/// let terrain = session.combine(dsm_bytes, ortho_bytes)?;
/// let rotated = session.rotate()?; // Some(..) once something was fused
/// ```
#[derive(Resource, Debug, Default)]
pub struct FusionSession {
    settings: FusionSettings,
    rotation: Rotation,
    rasters: Option<(Arc<Raster>, Arc<Raster>)>,
    current: Option<Arc<FusedTerrain>>,
    log: FusionLog,
}

impl FusionSession {
    /// Creates an empty session at rotation 0.
    pub fn new(settings: FusionSettings) -> Self {
        Self {
            settings,
            ..default()
        }
    }

    /// Settings applied to every fusion in this session.
    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    /// Rotation applied to the next fusion.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// The last successfully fused terrain, if any.
    pub fn current(&self) -> Option<&Arc<FusedTerrain>> {
        self.current.as_ref()
    }

    /// Whether a fusion has succeeded, so [`rotate`](Self::rotate) will re-fuse.
    pub fn has_rasters(&self) -> bool {
        self.rasters.is_some()
    }

    /// Status messages from every attempt in this session.
    pub fn log(&self) -> &FusionLog {
        &self.log
    }

    /// Job that decodes and fuses two new raster files at the current rotation.
    pub fn combine_job(&self, elevation: Vec<u8>, color: Vec<u8>) -> FusionJob {
        FusionJob::new(
            FusionInput::Bytes { elevation, color },
            self.rotation,
            self.settings,
        )
    }

    /// Advances the rotation and returns a job re-fusing the stored rasters,
    /// or `None` if nothing has been fused yet.
    pub fn rotate_job(&mut self) -> Option<FusionJob> {
        self.rotation = self.rotation.advance();
        self.log
            .record(format!("Rotation set to {}°", self.rotation.degrees()));
        let (elevation, color) = self.rasters.clone()?;
        Some(FusionJob::new(
            FusionInput::Rasters { elevation, color },
            self.rotation,
            self.settings,
        ))
    }

    /// Records a finished job and, on success, makes its result current.
    pub fn commit(&mut self, outcome: FusionOutcome) -> Result<Arc<FusedTerrain>, FusionError> {
        self.log.append(outcome.log);
        match outcome.result {
            Ok((elevation, color, terrain)) => {
                let terrain = Arc::new(terrain);
                self.rasters = Some((elevation, color));
                self.current = Some(terrain.clone());
                Ok(terrain)
            }
            Err(err) => {
                warn!("Terrain fusion failed: {err}");
                self.log.record(format!("Error: {err}"));
                Err(err)
            }
        }
    }

    /// Decodes and fuses two raster files synchronously.
    pub fn combine(
        &mut self,
        elevation: Vec<u8>,
        color: Vec<u8>,
    ) -> Result<Arc<FusedTerrain>, FusionError> {
        let outcome = self.combine_job(elevation, color).run();
        self.commit(outcome)
    }

    /// Fuses already-decoded rasters synchronously at the current rotation.
    pub fn combine_rasters(
        &mut self,
        elevation: Raster,
        color: Raster,
    ) -> Result<Arc<FusedTerrain>, FusionError> {
        let job = FusionJob::new(
            FusionInput::Rasters {
                elevation: Arc::new(elevation),
                color: Arc::new(color),
            },
            self.rotation,
            self.settings,
        );
        self.commit(job.run())
    }

    /// Advances the rotation by a quarter turn and re-fuses the stored rasters.
    ///
    /// Returns `Ok(None)` if nothing has been fused yet; only the rotation changes.
    pub fn rotate(&mut self) -> Result<Option<Arc<FusedTerrain>>, FusionError> {
        match self.rotate_job() {
            Some(job) => self.commit(job.run()).map(Some),
            None => Ok(None),
        }
    }
}
