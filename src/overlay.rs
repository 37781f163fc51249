use crate::{
    enums::MaskColorMode,
    intensity::{IntensityTransform, RenderError, gray_to_rgb},
    slice::{MaskPixels, Slice},
};

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::{Array2, Zip};

pub struct OverlayCompositor;

impl OverlayCompositor {
    /// Stretch the raw samples over the full 0..=255 range. A constant image
    /// maps to 0.
    ///
    /// Unlike [`IntensityTransform`] this ignores the slice's window, so mask
    /// visibility does not depend on window/level.
    pub fn min_max_gray(pixels: &Array2<f32>) -> Array2<u8> {
        let (min, max) = pixels
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        let range = max - min;
        if !(range.is_finite() && range > 0.0) {
            return Array2::zeros(pixels.dim());
        }
        let scale = 255.0 / range;
        Zip::from(pixels).par_map_collect(|&v| ((v - min) * scale).round().clamp(0.0, 255.0) as u8)
    }

    /// Blend `highlight` over every set mask pixel of the full-range slice at
    /// opacity `alpha`.
    ///
    /// Weights are applied in `f64` and rounded half away from zero, so white
    /// under red at 0.3 gives 178 in green and blue, not 179.
    ///
    /// # Errors
    ///
    /// [`RenderError::DimensionMismatch`] if the mask is not the slice's size
    pub fn composite(
        slice: &Slice,
        mask: &MaskPixels,
        alpha: f32,
        highlight: [u8; 3],
    ) -> Result<RgbImage, RenderError> {
        if mask.dim() != slice.dim() {
            return Err(RenderError::DimensionMismatch {
                mask: mask.dim(),
                slice: slice.dim(),
            });
        }

        let base = Self::min_max_gray(&slice.pixels);
        let (height, width) = base.dim();
        let alpha = f64::from(alpha);
        let blend = |under: u8, over: u8| {
            (f64::from(under) * (1.0 - alpha) + f64::from(over) * alpha)
                .round()
                .clamp(0.0, 255.0) as u8
        };

        Ok(ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            let (row, column) = (y as usize, x as usize);
            let gray = base[[row, column]];
            if mask.is_set(row, column) {
                Rgb(highlight.map(|channel| blend(gray, channel)))
            } else {
                let value = blend(gray, gray);
                Rgb([value, value, value])
            }
        }))
    }

    /// The mask drawn as its own panel, no blending.
    pub fn mask_panel(mask: &MaskPixels, mode: MaskColorMode) -> DynamicImage {
        match (mask, mode) {
            (MaskPixels::Gray(gray), MaskColorMode::Grayscale) => {
                DynamicImage::ImageLuma8(array_to_gray(gray))
            }
            (MaskPixels::Gray(gray), MaskColorMode::Rgb) => DynamicImage::ImageRgb8(gray_to_rgb(gray)),
            (MaskPixels::Color(_), MaskColorMode::Grayscale) => {
                DynamicImage::ImageLuma8(DynamicImage::ImageRgb8(color_to_rgb(mask)).to_luma8())
            }
            (MaskPixels::Color(_), MaskColorMode::Rgb) => DynamicImage::ImageRgb8(color_to_rgb(mask)),
        }
    }

    /// Windowed slice panel and mask panel for side-by-side review
    pub fn side_by_side(
        slice: &Slice,
        mask: &MaskPixels,
        mode: MaskColorMode,
    ) -> Result<(RgbImage, DynamicImage), RenderError> {
        Ok((IntensityTransform::render(slice)?, Self::mask_panel(mask, mode)))
    }
}

fn array_to_gray(gray: &Array2<u8>) -> GrayImage {
    let (height, width) = gray.dim();
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        Luma([gray[[y as usize, x as usize]]])
    })
}

fn color_to_rgb(mask: &MaskPixels) -> RgbImage {
    let (height, width) = mask.dim();
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| match mask {
        MaskPixels::Color(color) => {
            let (row, column) = (y as usize, x as usize);
            Rgb([
                color[[row, column, 0]],
                color[[row, column, 1]],
                color[[row, column, 2]],
            ])
        }
        MaskPixels::Gray(gray) => {
            let value = gray[[y as usize, x as usize]];
            Rgb([value, value, value])
        }
    })
}
