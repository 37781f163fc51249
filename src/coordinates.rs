use crate::slice::Slice;

use std::fmt;

/// A pointer position resolved against the source slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMapping {
    pub pixel_x: usize,
    pub pixel_y: usize,
    /// Physical offset from the top-left pixel along columns
    pub mm_x: f64,
    /// Physical offset from the top-left pixel along rows
    pub mm_y: f64,
    /// Rescaled, unwindowed sample value
    pub intensity: f64,
}

/// What the viewer shows for the pixel under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelReadout {
    /// 1-based position in the sequence
    pub slice_number: usize,
    pub mapping: PixelMapping,
}

impl PixelReadout {
    pub fn new(index: usize, mapping: PixelMapping) -> Self {
        Self {
            slice_number: index + 1,
            mapping,
        }
    }
}

impl fmt::Display for PixelReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.mapping;
        write!(
            f,
            "Slice {} | x={}, y={} (mm: {:.2}, {:.2}) | HU={}",
            self.slice_number,
            m.pixel_x,
            m.pixel_y,
            m.mm_x,
            m.mm_y,
            m.intensity.trunc() as i64
        )
    }
}

pub struct CoordinateMapper;

impl CoordinateMapper {
    /// Source pixel (x, y) under a pointer on an image of `source` size
    /// (height, width) displayed at `displayed_width` x `displayed_height`.
    pub fn source_pixel(
        pointer_x: f64,
        pointer_y: f64,
        displayed_width: f64,
        displayed_height: f64,
        source: (usize, usize),
    ) -> Option<(usize, usize)> {
        let (source_height, source_width) = source;
        if source_width == 0 || source_height == 0 {
            return None;
        }
        let scale_x = displayed_width / source_width as f64;
        let scale_y = displayed_height / source_height as f64;
        if !(scale_x > 0.0 && scale_y > 0.0) {
            return None;
        }

        let x = (pointer_x / scale_x).floor();
        let y = (pointer_y / scale_y).floor();
        let in_bounds = (0.0..source_width as f64).contains(&x)
            && (0.0..source_height as f64).contains(&y);
        in_bounds.then_some((x as usize, y as usize))
    }

    /// Resolve a pointer to source pixel, physical offset and intensity.
    ///
    /// `None` when the pointer lies outside the displayed image.
    pub fn map(
        pointer_x: f64,
        pointer_y: f64,
        displayed_width: f64,
        displayed_height: f64,
        slice: &Slice,
    ) -> Option<PixelMapping> {
        let (pixel_x, pixel_y) = Self::source_pixel(
            pointer_x,
            pointer_y,
            displayed_width,
            displayed_height,
            slice.dim(),
        )?;
        let raw = slice.raw_value(pixel_y, pixel_x)?;
        let metadata = &slice.metadata;
        let (row_spacing, column_spacing) = metadata.pixel_spacing;

        Some(PixelMapping {
            pixel_x,
            pixel_y,
            mm_x: pixel_x as f64 * column_spacing,
            mm_y: pixel_y as f64 * row_spacing,
            intensity: metadata.rescale(f64::from(raw)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::SliceMetadata;
    use ndarray::Array2;

    fn ct_slice() -> Slice {
        let mut pixels = Array2::zeros((512, 512));
        pixels[[10, 256]] = 24.0;
        Slice::new(
            "ct",
            pixels,
            SliceMetadata {
                rescale_intercept: -1024.0,
                pixel_spacing: (0.5, 0.7),
                ..SliceMetadata::default()
            },
        )
    }

    #[test]
    fn halves_pointer_on_half_size_display() {
        assert_eq!(
            CoordinateMapper::source_pixel(128.0, 128.0, 256.0, 256.0, (512, 512)),
            Some((256, 256))
        );
    }

    #[test]
    fn pointer_outside_display_is_absent() {
        let source = (512, 512);
        assert_eq!(CoordinateMapper::source_pixel(257.0, 0.0, 256.0, 256.0, source), None);
        assert_eq!(CoordinateMapper::source_pixel(-0.5, 0.0, 256.0, 256.0, source), None);
        assert_eq!(CoordinateMapper::source_pixel(0.0, 0.0, 0.0, 256.0, source), None);
        assert_eq!(CoordinateMapper::source_pixel(0.0, 0.0, 256.0, 256.0, (0, 0)), None);
    }

    #[test]
    fn maps_spacing_row_then_column() {
        let mapping = CoordinateMapper::map(128.0, 5.0, 256.0, 256.0, &ct_slice()).expect("inside");
        assert_eq!((mapping.pixel_x, mapping.pixel_y), (256, 10));
        assert!((mapping.mm_x - 256.0 * 0.7).abs() < 1e-9);
        assert!((mapping.mm_y - 10.0 * 0.5).abs() < 1e-9);
        assert_eq!(mapping.intensity, -1000.0);
    }

    #[test]
    fn readout_text() {
        let mapping = CoordinateMapper::map(128.0, 5.0, 256.0, 256.0, &ct_slice()).expect("inside");
        assert_eq!(
            PixelReadout::new(2, mapping).to_string(),
            "Slice 3 | x=256, y=10 (mm: 179.20, 5.00) | HU=-1000"
        );
    }

    #[test]
    fn readout_truncates_intensity_toward_zero() {
        let mapping = PixelMapping {
            pixel_x: 0,
            pixel_y: 0,
            mm_x: 0.0,
            mm_y: 0.0,
            intensity: -3.7,
        };
        assert!(PixelReadout::new(0, mapping).to_string().ends_with("HU=-3"));
    }
}
