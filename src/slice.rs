use crate::enums::PhotometricPolarity;

use ndarray::{Array2, Array3};

/// Display and ordering attributes of a slice, with defaults already applied
/// by the decode adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceMetadata {
    /// Source-declared ordering key. `None` when absent or unparseable.
    pub instance_number: Option<i64>,
    pub rescale_slope: f64,
    pub rescale_intercept: f64,
    pub window_center: Option<f64>,
    pub window_width: Option<f64>,
    pub polarity: PhotometricPolarity,
    /// (row spacing, column spacing) in millimetres
    pub pixel_spacing: (f64, f64),
    pub series_description: Option<String>,
}

impl Default for SliceMetadata {
    fn default() -> Self {
        Self {
            instance_number: None,
            rescale_slope: 1.0,
            rescale_intercept: 0.0,
            window_center: None,
            window_width: None,
            polarity: PhotometricPolarity::Normal,
            pixel_spacing: (1.0, 1.0),
            series_description: None,
        }
    }
}

impl SliceMetadata {
    /// Sort key used by the slice store. Slices without an instance number
    /// sort as 0.
    pub fn sort_key(&self) -> i64 {
        self.instance_number.unwrap_or(0)
    }

    /// Map a raw stored sample to physical units (e.g. Hounsfield).
    #[inline]
    pub fn rescale(&self, raw: f64) -> f64 {
        raw * self.rescale_slope + self.rescale_intercept
    }
}

/// One decoded slice: raw samples in (row, column) order plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub name: String,
    pub pixels: Array2<f32>,
    pub metadata: SliceMetadata,
}

impl Slice {
    pub fn new(name: impl Into<String>, pixels: Array2<f32>, metadata: SliceMetadata) -> Self {
        Self {
            name: name.into(),
            pixels,
            metadata,
        }
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn raw_value(&self, row: usize, column: usize) -> Option<f32> {
        self.pixels.get((row, column)).copied()
    }
}

/// Slices in display order. Immutable once built; a reload builds a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceSequence {
    slices: Vec<Slice>,
}

impl SliceSequence {
    /// Stable-sort `slices` ascending by instance number. Duplicates are kept
    /// and stay in their incoming order.
    pub fn new(mut slices: Vec<Slice>) -> Self {
        slices.sort_by_key(|slice| slice.metadata.sort_key());
        Self { slices }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slice> {
        self.slices.iter()
    }

    /// Identifier masks are matched against: the instance number, or the
    /// slice's position when it has none.
    pub fn match_key(&self, index: usize) -> Option<i64> {
        let slice = self.slices.get(index)?;
        Some(
            slice
                .metadata
                .instance_number
                .unwrap_or(index as i64),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskPixels {
    Gray(Array2<u8>),
    /// (row, column, channel) with three RGB channels
    Color(Array3<u8>),
}

impl MaskPixels {
    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Gray(gray) => gray.dim(),
            Self::Color(color) => {
                let (height, width, _) = color.dim();
                (height, width)
            }
        }
    }

    /// A mask pixel is set when any of its channels is non-zero.
    pub fn is_set(&self, row: usize, column: usize) -> bool {
        match self {
            Self::Gray(gray) => gray[[row, column]] > 0,
            Self::Color(color) => (0..color.dim().2).any(|c| color[[row, column, c]] > 0),
        }
    }
}

/// A label image aligned to a slice by its file-name identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskImage {
    pub name: String,
    pub source_identifier: i64,
    pub pixels: MaskPixels,
}

/// A slice together with the mask aligned to it, if any.
#[derive(Debug, Clone, Copy)]
pub struct AlignedFrame<'a> {
    pub index: usize,
    pub slice: &'a Slice,
    pub mask: Option<&'a MaskImage>,
}

/// A loaded series: the ordered slices and a mask slot for every slice.
///
/// Slices and masks only ever leave a study paired as an [`AlignedFrame`].
#[derive(Debug, Clone, Default)]
pub struct Study {
    slices: SliceSequence,
    masks: Vec<Option<MaskImage>>,
}

impl Study {
    pub fn new(slices: SliceSequence, mut masks: Vec<Option<MaskImage>>) -> Self {
        if masks.len() != slices.len() {
            log::warn!(
                "Mask slots ({}) differ from slice count ({}), padding/truncating",
                masks.len(),
                slices.len()
            );
            masks.resize_with(slices.len(), || None);
        }
        Self { slices, masks }
    }

    pub fn without_masks(slices: SliceSequence) -> Self {
        let masks = vec![None; slices.len()];
        Self { slices, masks }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn slices(&self) -> &SliceSequence {
        &self.slices
    }

    pub fn mask_count(&self) -> usize {
        self.masks.iter().flatten().count()
    }

    pub fn frame(&self, index: usize) -> Option<AlignedFrame<'_>> {
        let slice = self.slices.get(index)?;
        Some(AlignedFrame {
            index,
            slice,
            mask: self.masks.get(index).and_then(Option::as_ref),
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = AlignedFrame<'_>> {
        (0..self.len()).filter_map(|index| self.frame(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(name: &str, instance_number: Option<i64>) -> Slice {
        Slice::new(
            name,
            Array2::zeros((1, 1)),
            SliceMetadata {
                instance_number,
                ..SliceMetadata::default()
            },
        )
    }

    fn names(sequence: &SliceSequence) -> Vec<&str> {
        sequence.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn sorts_by_instance_number_keeping_duplicates_in_load_order() {
        let sequence = SliceSequence::new(vec![
            slice("c", Some(3)),
            slice("a1", Some(1)),
            slice("b", Some(2)),
            slice("a2", Some(1)),
        ]);
        assert_eq!(names(&sequence), ["a1", "a2", "b", "c"]);
    }

    #[test]
    fn missing_instance_number_sorts_first_but_matches_by_position() {
        let sequence = SliceSequence::new(vec![slice("five", Some(5)), slice("none", None)]);
        assert_eq!(names(&sequence), ["none", "five"]);
        assert_eq!(sequence.match_key(0), Some(0));
        assert_eq!(sequence.match_key(1), Some(5));
        assert_eq!(sequence.match_key(2), None);
    }

    #[test]
    fn colour_mask_pixel_is_set_when_any_channel_is_non_zero() {
        let mut color = Array3::zeros((1, 2, 3));
        color[[0, 1, 2]] = 9;
        let mask = MaskPixels::Color(color);
        assert_eq!(mask.dim(), (1, 2));
        assert!(!mask.is_set(0, 0));
        assert!(mask.is_set(0, 1));
    }

    #[test]
    fn study_pairs_each_slice_with_its_mask_slot() {
        let sequence = SliceSequence::new(vec![slice("a", Some(1)), slice("b", Some(2))]);
        let mask = MaskImage {
            name: "2".into(),
            source_identifier: 2,
            pixels: MaskPixels::Gray(Array2::zeros((1, 1))),
        };
        let study = Study::new(sequence, vec![None, Some(mask)]);

        let frames: Vec<_> = study.frames().collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].mask.is_none());
        assert_eq!(frames[1].slice.name, "b");
        assert_eq!(frames[1].mask.map(|m| m.source_identifier), Some(2));
        assert_eq!(study.mask_count(), 1);
    }
}
