//! Raster decoding from raw image-file bytes.
//!
//! TIFF buffers (including single-band floating point DSMs) go through the
//! `tiff` crate; every other format `image` recognizes goes through `image`.
//! Channels are split into separate bands in file order and sample values are
//! passed through untouched.

use std::io::Cursor;

use bevy::prelude::*;
use image::DynamicImage;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::DecodeError;
use crate::raster::Raster;

/// TIFF tag written by GDAL holding the no-data value as an ASCII string.
const GDAL_NODATA_TAG: u16 = 42113;

/// `PlanarConfiguration` value for pixel-interleaved samples.
const PLANAR_CHUNKY: u16 = 1;

const TIFF_MAGIC: [&[u8; 4]; 4] = [b"II*\0", b"MM\0*", b"II+\0", b"MM\0+"];

/// Decodes an image file held in memory into a [`Raster`].
///
/// # Errors
///
/// Returns [`DecodeError`] if the buffer is empty, not a supported format,
/// truncated, or declares a zero width or height.
pub fn decode(bytes: &[u8]) -> Result<Raster, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let raster = if is_tiff(bytes) {
        decode_tiff(bytes)?
    } else {
        decode_image(bytes)?
    };

    debug!(
        "decoded {}×{} raster with {} band(s)",
        raster.width(),
        raster.height(),
        raster.band_count()
    );
    Ok(raster)
}

fn is_tiff(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && TIFF_MAGIC.iter().any(|magic| bytes[..4] == magic[..])
}

fn decode_tiff(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = checked_dimensions(width as usize, height as usize)?;

    // `read_image` only yields the first plane of a band-interleaved file.
    let planar_config = match decoder.find_tag(Tag::PlanarConfiguration)? {
        Some(value) => value.into_u16()?,
        None => PLANAR_CHUNKY,
    };
    if planar_config != PLANAR_CHUNKY {
        return Err(DecodeError::UnsupportedFormat(
            "planar (band-interleaved) TIFF".into(),
        ));
    }

    let band_count = match decoder.colortype()? {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) | ColorType::CMYK(_) => 4,
        other => {
            return Err(DecodeError::UnsupportedFormat(format!(
                "TIFF color type {other:?}"
            )));
        }
    };

    let no_data = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA_TAG))
        .ok()
        .and_then(|s| {
            s.trim_matches(|c: char| c == '\0' || c.is_whitespace())
                .parse::<f32>()
                .ok()
        });

    let raster = match decoder.read_image()? {
        DecodingResult::U8(data) => split_bands(width, height, band_count, &data),
        DecodingResult::U16(data) => split_bands(width, height, band_count, &data),
        DecodingResult::U32(data) => split_bands(width, height, band_count, &data),
        DecodingResult::I8(data) => split_bands(width, height, band_count, &data),
        DecodingResult::I16(data) => split_bands(width, height, band_count, &data),
        DecodingResult::I32(data) => split_bands(width, height, band_count, &data),
        DecodingResult::F32(data) => split_bands(width, height, band_count, &data),
        DecodingResult::F64(data) => split_bands(width, height, band_count, &data),
        DecodingResult::U64(data) => {
            let wide: Vec<f64> = data.iter().map(|&v| v as f64).collect();
            split_bands(width, height, band_count, &wide)
        }
        DecodingResult::I64(data) => {
            let wide: Vec<f64> = data.iter().map(|&v| v as f64).collect();
            split_bands(width, height, band_count, &wide)
        }
    }?;

    Ok(raster.with_no_data(no_data))
}

fn decode_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let format = image::guess_format(bytes)
        .map_err(|_| DecodeError::UnsupportedFormat("unrecognized file signature".into()))?;
    let image = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = checked_dimensions(image.width() as usize, image.height() as usize)?;
    let band_count = image.color().channel_count() as usize;

    match &image {
        DynamicImage::ImageLuma8(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageLumaA8(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageRgb8(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageRgba8(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageLuma16(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageLumaA16(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageRgb16(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageRgba16(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageRgb32F(buf) => split_bands(width, height, band_count, buf.as_raw()),
        DynamicImage::ImageRgba32F(buf) => split_bands(width, height, band_count, buf.as_raw()),
        other => Err(DecodeError::UnsupportedFormat(format!(
            "pixel layout {:?}",
            other.color()
        ))),
    }
}

fn checked_dimensions(width: usize, height: usize) -> Result<(usize, usize), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroDimensions { width, height });
    }
    Ok((width, height))
}

fn split_bands<T>(
    width: usize,
    height: usize,
    band_count: usize,
    samples: &[T],
) -> Result<Raster, DecodeError>
where
    T: Copy + Into<f64>,
{
    Raster::from_interleaved(width, height, band_count, samples).ok_or(DecodeError::Truncated {
        expected: width * height * band_count,
        actual: samples.len(),
    })
}
