//! In-memory raster representation shared by the decoder and the fusion engine.

/// A decoded 2D raster with one or more sample bands.
///
/// Every band holds exactly `width * height` samples in row-major order
/// (`index = row * width + col`). Sample values are stored as decoded, including
/// out-of-range and no-data sentinels.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    bands: Vec<Vec<f32>>,
    no_data: Option<f32>,
}

impl Raster {
    /// Creates a raster from separate bands.
    ///
    /// Returns `None` if either dimension is zero, no band is supplied, or any
    /// band length differs from `width * height`.
    pub fn new(width: usize, height: usize, bands: Vec<Vec<f32>>) -> Option<Self> {
        let len = width.checked_mul(height)?;
        if len == 0 || bands.is_empty() || bands.iter().any(|b| b.len() != len) {
            return None;
        }
        Some(Self {
            width,
            height,
            bands,
            no_data: None,
        })
    }

    /// Splits interleaved samples (`[b0, b1, .., b0, b1, ..]`) into bands.
    ///
    /// Returns `None` under the same conditions as [`Raster::new`], or if
    /// `samples.len() != width * height * band_count`.
    pub fn from_interleaved<T>(
        width: usize,
        height: usize,
        band_count: usize,
        samples: &[T],
    ) -> Option<Self>
    where
        T: Copy + Into<f64>,
    {
        let len = width.checked_mul(height)?;
        if band_count == 0 || samples.len() != len.checked_mul(band_count)? {
            return None;
        }
        let mut bands: Vec<Vec<f32>> = (0..band_count).map(|_| Vec::with_capacity(len)).collect();
        for pixel in samples.chunks_exact(band_count) {
            for (band, &sample) in bands.iter_mut().zip(pixel) {
                band.push(sample.into() as f32);
            }
        }
        Self::new(width, height, bands)
    }

    /// Declares a sample value that marks missing measurements.
    pub fn with_no_data(mut self, no_data: Option<f32>) -> Self {
        self.no_data = no_data;
        self
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of bands (channels).
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Samples of band `index`, or `None` if the raster has fewer bands.
    pub fn band(&self, index: usize) -> Option<&[f32]> {
        self.bands.get(index).map(Vec::as_slice)
    }

    /// Sample value marking missing measurements, if the source declared one.
    pub fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    /// Whether `sample` is a usable measurement: finite and not the no-data value.
    pub fn is_valid_sample(&self, sample: f32) -> bool {
        sample.is_finite() && self.no_data != Some(sample)
    }
}
