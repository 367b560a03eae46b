//! Color raster to RGBA texture conversion with quarter-turn rotation.
//!
//! Rotation is applied by remapping the read index, so the output is produced
//! in a single pass and always keeps the elevation grid's width and height.

use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use serde::{Deserialize, Serialize};

use crate::error::FusionError;
use crate::raster::Raster;

/// Clockwise rotation of the color raster relative to the elevation raster,
/// in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Builds a rotation from a quarter-turn count, wrapping modulo 4.
    pub fn from_quarter_turns(turns: u32) -> Self {
        match turns % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    /// Number of clockwise quarter turns, in `0..4`.
    pub fn quarter_turns(self) -> u32 {
        self as u32
    }

    /// Clockwise rotation in degrees.
    pub fn degrees(self) -> u32 {
        self.quarter_turns() * 90
    }

    /// The next rotation in the cycle 0 → 90 → 180 → 270 → 0.
    pub fn advance(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// Raster index read for output pixel `i` of a `width × height` texture.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero. [`Raster`] dimensions are always non-zero.
    pub fn source_index(self, i: usize, width: usize, height: usize) -> usize {
        assert!(width > 0, "texture width must be non-zero");
        let row = i / width;
        let col = i % width;
        match self {
            Rotation::Deg0 => i,
            Rotation::Deg90 => width * (row + 1) - 1 - col,
            Rotation::Deg180 => width * height - 1 - i,
            Rotation::Deg270 => width * (height - 1 - row) + col,
        }
    }
}

/// Opaque RGBA8 pixels, row-major, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBuffer {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl TextureBuffer {
    /// Texture width in pixels, equal to the elevation raster width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Texture height in pixels, equal to the elevation raster height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major RGBA8 bytes.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// `[r, g, b, a]` of pixel `i`, or `None` if out of range.
    pub fn pixel(&self, i: usize) -> Option<[u8; 4]> {
        let p = self.rgba.get(i * 4..i * 4 + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Converts into a Bevy [`Image`] (`Rgba8UnormSrgb`) with clamp-to-edge
    /// addressing so the texture spans the mesh exactly once.
    pub fn to_image(&self) -> Image {
        let mut image = Image::new(
            Extent3d {
                width: self.width as u32,
                height: self.height as u32,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.rgba.clone(),
            TextureFormat::Rgba8UnormSrgb,
            default(),
        );

        image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            address_mode_u: ImageAddressMode::ClampToEdge,
            address_mode_v: ImageAddressMode::ClampToEdge,
            ..default()
        });

        image
    }
}

/// Packs bands 0..3 of `color` into an opaque RGBA texture, reading each output
/// pixel from its rotated source index.
///
/// Samples are clamped to `[0, 255]` and rounded; NaN becomes 0. Any 4th band
/// is ignored and alpha is always 255.
///
/// # Errors
///
/// Returns [`FusionError::Stage`] if `color` has fewer than three bands.
///
/// # Example
///
/// ```ignore
/// use bevy_terrain_fusion::{pack_texture, Raster, Rotation};
///
/// let band = vec![10.0, 20.0, 30.0, 40.0];
/// let color = Raster::new(2, 2, vec![band.clone(), band.clone(), band]).unwrap();
/// let texture = pack_texture(&color, Rotation::Deg180)?;
/// assert_eq!(texture.pixel(0), Some([40, 40, 40, 255]));
/// ```
pub fn pack_texture(color: &Raster, rotation: Rotation) -> Result<TextureBuffer, FusionError> {
    let (Some(r), Some(g), Some(b)) = (color.band(0), color.band(1), color.band(2)) else {
        return Err(FusionError::stage(
            "texture",
            format!(
                "color raster needs at least 3 bands, found {}",
                color.band_count()
            ),
        ));
    };

    let (width, height) = color.dimensions();
    let pixel_count = width * height;
    let mut rgba: Vec<u8> = Vec::with_capacity(pixel_count * 4);

    for i in 0..pixel_count {
        let src = rotation.source_index(i, width, height);
        rgba.extend_from_slice(&[to_byte(r[src]), to_byte(g[src]), to_byte(b[src]), 255]);
    }

    Ok(TextureBuffer {
        width,
        height,
        rgba,
    })
}

fn to_byte(sample: f32) -> u8 {
    // `as` saturates and maps NaN to 0.
    sample.round() as u8
}
