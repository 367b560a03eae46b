//! Fuses a Digital Surface Model and a co-registered color raster into a
//! textured Bevy terrain mesh.
//!
//! # Pipeline
//!
//! - **Decoding**: [`decode`] turns raw TIFF/PNG/JPEG/... bytes into a
//!   [`Raster`] with one flat sample array per band.
//! - **Mesh generation**: [`TerrainMeshBuilder`] displaces a regular grid by the
//!   normalized elevation band and recomputes smooth normals.
//! - **Texturing**: [`pack_texture`] packs the color bands into an opaque RGBA
//!   buffer, optionally rotated by a quarter-turn multiple ([`Rotation`]).
//! - **Fusion**: [`fuse`] validates dimensions and runs both steps;
//!   [`FusionSession`] carries rotation and the last good rasters between calls.
//! - **Presentation**: [`TerrainFusionPlugin`] runs fusion on the async compute
//!   pool and swaps the displayed mesh through a [`TerrainSlot`].
//!
//! # Example
//!
//! ```ignore
//! use bevy_terrain_fusion::{FusionSession, FusionSettings};
//!
//! let mut session = FusionSession::new(FusionSettings::default());
//! let terrain = session.combine(std::fs::read("dsm.tif")?, std::fs::read("ortho.png")?)?;
//! let mesh = terrain.mesh.to_mesh();
//! let image = terrain.texture.to_image();
//! ```

pub mod decoder;
pub mod error;
pub mod fusion;
pub mod mesher;
pub mod plugin;
pub mod raster;
pub mod session;
pub mod settings;
pub mod slot;
pub mod texture;

pub use decoder::decode;
pub use error::{DecodeError, FusionError, RasterRole};
pub use fusion::{FusedTerrain, FusionLog, fuse, fuse_logged};
pub use mesher::{TerrainMesh, TerrainMeshBuilder};
pub use plugin::{FusedTerrainDisplay, FusionRequest, FusionRequests, TerrainFusionPlugin};
pub use raster::Raster;
pub use session::{FusionInput, FusionJob, FusionOutcome, FusionSession};
pub use settings::FusionSettings;
pub use slot::TerrainSlot;
pub use texture::{Rotation, TextureBuffer, pack_texture};
