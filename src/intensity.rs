use crate::{enums::PhotometricPolarity, slice::Slice};

use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::{Array2, Zip};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Slice {name} cannot be windowed: {reason}")]
    MalformedSlice { name: String, reason: String },

    #[error("Mask shape {mask:?} does not match slice shape {slice:?}")]
    DimensionMismatch {
        mask: (usize, usize),
        slice: (usize, usize),
    },

    #[error("Frame {index} has no aligned mask")]
    MissingMask { index: usize },

    #[error("No slices loaded")]
    EmptySession,
}

/// Display window in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    lower: f64,
    upper: f64,
}

impl Window {
    /// `None` if the window is degenerate (zero, negative or non-finite
    /// width).
    pub fn new(center: f64, width: f64) -> Option<Self> {
        let lower = center - width / 2.0;
        let upper = center + width / 2.0;
        (lower.is_finite() && upper.is_finite() && upper > lower).then_some(Self { lower, upper })
    }

    /// The slice's own window
    pub fn for_slice(slice: &Slice) -> Result<Self, RenderError> {
        let malformed = |reason: String| RenderError::MalformedSlice {
            name: slice.name.clone(),
            reason,
        };
        let metadata = &slice.metadata;
        let center = metadata
            .window_center
            .ok_or_else(|| malformed("missing window center".into()))?;
        let width = metadata
            .window_width
            .ok_or_else(|| malformed("missing window width".into()))?;
        Self::new(center, width)
            .ok_or_else(|| malformed(format!("degenerate window (center {center}, width {width})")))
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Clip to the window, then scale linearly onto 0..=255 and floor.
    #[inline]
    pub fn apply(&self, value: f64) -> u8 {
        let clipped = value.clamp(self.lower, self.upper);
        ((clipped - self.lower) / (self.upper - self.lower) * 255.0).floor() as u8
    }
}

pub struct IntensityTransform;

impl IntensityTransform {
    /// Rescale, window, and apply polarity, yielding a gray RGB image.
    ///
    /// # Errors
    ///
    /// [`RenderError::MalformedSlice`] when the slice lacks a usable window.
    /// Only this slice is affected; callers skip or flag the frame.
    pub fn render(slice: &Slice) -> Result<RgbImage, RenderError> {
        Ok(gray_to_rgb(&Self::render_gray(slice)?))
    }

    pub fn render_gray(slice: &Slice) -> Result<Array2<u8>, RenderError> {
        let window = Window::for_slice(slice)?;
        let metadata = &slice.metadata;
        let inverted = metadata.polarity == PhotometricPolarity::Inverted;

        Ok(Zip::from(&slice.pixels).par_map_collect(|&raw| {
            let value = window.apply(metadata.rescale(f64::from(raw)));
            if inverted { 255 - value } else { value }
        }))
    }
}

/// Replicate a gray plane into three channels.
pub(crate) fn gray_to_rgb(gray: &Array2<u8>) -> RgbImage {
    let (height, width) = gray.dim();
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let value = gray[[y as usize, x as usize]];
        Rgb([value, value, value])
    })
}
