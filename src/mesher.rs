//! Displacement-mapped grid mesh generation from an elevation [`Raster`].
//!
//! Produces a [`TerrainMesh`] with:
//! - one vertex per raster sample, in the raster's row-major order
//! - heights normalized to `[0, elevation_scale]`
//! - smooth per-vertex normals (area-weighted average of adjacent face normals)
//! - UVs that stretch a single texture over the whole grid

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::error::FusionError;
use crate::raster::Raster;
use crate::settings::FusionSettings;

/// CPU-side terrain geometry, kept separate from Bevy's [`Mesh`] so it can be
/// built off the main thread and inspected in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    width: usize,
    height: usize,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl TerrainMesh {
    /// Grid columns (raster width).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid rows (raster height).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of vertices, `width * height`.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Displaced vertex positions in raster order.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Unit per-vertex normals, parallel to [`positions`](Self::positions).
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Texture coordinates spanning `[0, 1]²` over the grid.
    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// CCW `TriangleList` indices, six per grid cell.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Per-vertex displacement along +Y, in raster order.
    pub fn displacements(&self) -> impl Iterator<Item = f32> + '_ {
        self.positions.iter().map(|p| p[1])
    }

    /// Converts into a `TriangleList` Bevy [`Mesh`] with positions, normals and UV_0.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

impl From<&TerrainMesh> for Mesh {
    fn from(terrain: &TerrainMesh) -> Self {
        terrain.to_mesh()
    }
}

/// Builds a [`TerrainMesh`] from band 0 of an elevation [`Raster`].
///
/// The grid lies in the XZ plane centered on the origin; its footprint is
/// `width / world_scale_divisor` by `height / world_scale_divisor`. Vertex `j`
/// sits at column `j % width` (X) and row `j / width` (Z), so vertex order
/// matches raster sample order and texture pixel order exactly.
///
/// # Example
///
/// ```ignore
/// use bevy_terrain_fusion::{FusionSettings, Raster, TerrainMeshBuilder};
///
/// let dsm = Raster::new(2, 2, vec![vec![0.0, 10.0, 20.0, 30.0]]).unwrap();
/// let terrain = TerrainMeshBuilder::new(FusionSettings::default()).build(&dsm)?;
/// assert_eq!(terrain.vertex_count(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TerrainMeshBuilder {
    settings: FusionSettings,
}

impl TerrainMeshBuilder {
    /// Creates a builder using the footprint and relief scale from `settings`.
    pub fn new(settings: FusionSettings) -> Self {
        Self { settings }
    }

    /// Builds the displaced grid.
    ///
    /// # Errors
    ///
    /// - [`FusionError::Stage`] if the raster has no band 0.
    /// - [`FusionError::InvalidElevationData`] if band 0 has no valid sample.
    pub fn build(&self, elevation: &Raster) -> Result<TerrainMesh, FusionError> {
        let samples = elevation
            .band(0)
            .ok_or_else(|| FusionError::stage("elevation", "raster has no elevation band"))?;
        let (min, max) =
            elevation_range(elevation, samples).ok_or(FusionError::InvalidElevationData)?;

        let w = elevation.width();
        let h = elevation.height();
        let (world_width, world_depth) = self.settings.footprint(w, h);
        let elevation_scale = self.settings.elevation_scale(w);
        let step_x = if w > 1 { world_width / (w - 1) as f32 } else { 0.0 };
        let step_z = if h > 1 { world_depth / (h - 1) as f32 } else { 0.0 };
        let range = max - min;

        let vertex_count = w * h;
        let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
        let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);

        for (j, &sample) in samples.iter().enumerate() {
            let row = j / w;
            let col = j % w;
            let world_x = col as f32 * step_x - world_width * 0.5;
            let world_z = row as f32 * step_z - world_depth * 0.5;
            // Flat rasters and invalid samples sit on the base plane.
            let world_y = if range > 0.0 && elevation.is_valid_sample(sample) {
                (sample - min) / range * elevation_scale
            } else {
                0.0
            };

            positions.push([world_x, world_y, world_z]);
            uvs.push([unit(col, w), unit(row, h)]);
        }

        // Each quad (x, z) → (x+1, z+1) emits two CCW triangles:
        //   tl──tr
        //   │╲  │     Triangle 1: tl, bl, tr
        //   │ ╲ │     Triangle 2: tr, bl, br
        //   bl──br
        let quad_count = w.saturating_sub(1) * h.saturating_sub(1);
        let mut indices: Vec<u32> = Vec::with_capacity(quad_count * 6);

        for z in 0..h.saturating_sub(1) {
            for x in 0..w.saturating_sub(1) {
                let tl = (z * w + x) as u32;
                let tr = (z * w + x + 1) as u32;
                let bl = ((z + 1) * w + x) as u32;
                let br = ((z + 1) * w + x + 1) as u32;

                indices.extend_from_slice(&[tl, bl, tr]);
                indices.extend_from_slice(&[tr, bl, br]);
            }
        }

        // Normals come from the displaced positions, so this must run after
        // every vertex height is final.
        let normals = vertex_normals(&positions, &indices);

        Ok(TerrainMesh {
            width: w,
            height: h,
            positions,
            normals,
            uvs,
            indices,
        })
    }
}

/// Minimum and maximum over valid samples, or `None` if there are none.
fn elevation_range(elevation: &Raster, samples: &[f32]) -> Option<(f32, f32)> {
    samples
        .iter()
        .copied()
        .filter(|&s| elevation.is_valid_sample(s))
        .fold(None, |range, s| match range {
            None => Some((s, s)),
            Some((min, max)) => Some((min.min(s), max.max(s))),
        })
}

fn unit(index: usize, len: usize) -> f32 {
    if len > 1 {
        index as f32 / (len - 1) as f32
    } else {
        0.0
    }
}

/// Area-weighted smooth normals.
///
/// Each triangle's unnormalized cross product (proportional to its area) is
/// accumulated at its three vertices, then normalized. Vertices with no
/// contribution (single-row or single-column grids) default to +Y.
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals: Vec<Vec3> = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let p0 = Vec3::from(positions[i0]);
        let p1 = Vec3::from(positions[i1]);
        let p2 = Vec3::from(positions[i2]);
        let face_normal = (p1 - p0).cross(p2 - p0);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    normals
        .iter()
        .map(|n| {
            let len = n.length();
            if len > f32::EPSILON { (*n / len).into() } else { [0.0, 1.0, 0.0] }
        })
        .collect()
}
