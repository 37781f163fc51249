use crate::{
    config::ViewerConfig,
    coordinates::{CoordinateMapper, PixelReadout},
    decode::{DicomDecoder, MaskDecoder, SliceDecoder},
    enums::RenderMode,
    intensity::{IntensityTransform, RenderError},
    mask_aligner::{CountMismatchWarning, MaskAligner, SkippedMask},
    overlay::OverlayCompositor,
    playback::PlaybackController,
    slice::{AlignedFrame, Study},
    slice_loader::{SkippedEntry, SliceStore, SliceStoreError},
    source::{SourceEntry, read_directory},
};

use image::{DynamicImage, RgbImage};
use std::path::Path;

/// A frame ready for display, shaped by the requested [`RenderMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedFrame {
    Plain(RgbImage),
    Overlay(RgbImage),
    SideBySide { slice: RgbImage, mask: DynamicImage },
}

/// Diagnostics from a successful (re)load.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub slice_count: usize,
    pub mask_count: usize,
    pub skipped_slices: Vec<SkippedEntry>,
    pub skipped_masks: Vec<SkippedMask>,
    pub count_mismatch: Option<CountMismatchWarning>,
}

/// One reviewer's session: the loaded study, its playback state and the
/// config they were opened with. Sessions share nothing mutable.
#[derive(Debug)]
pub struct ViewerSession {
    config: ViewerConfig,
    study: Study,
    playback: PlaybackController,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        let playback = PlaybackController::new(0, &config);
        Self {
            config,
            study: Study::default(),
            playback,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn study(&self) -> &Study {
        &self.study
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackController {
        &mut self.playback
    }

    /// Replace the study with freshly decoded slices and, optionally, masks.
    ///
    /// The new study is fully built before it replaces the old one; on error
    /// the previous study and playback position are kept.
    pub fn load<D>(
        &mut self,
        slice_entries: &[SourceEntry],
        mask_entries: Option<&[SourceEntry]>,
        decoder: &D,
    ) -> Result<LoadSummary, SliceStoreError>
    where
        D: SliceDecoder + MaskDecoder + Sync,
    {
        let report = SliceStore::load(slice_entries, decoder)?;
        let mut summary = LoadSummary {
            slice_count: report.sequence.len(),
            skipped_slices: report.skipped,
            ..LoadSummary::default()
        };

        let study = match mask_entries {
            Some(entries) => {
                let alignment = MaskAligner::align(&report.sequence, entries, decoder);
                summary.mask_count = alignment.matched_count();
                summary.count_mismatch = alignment.count_mismatch();
                let (masks, skipped) = alignment.into_parts();
                summary.skipped_masks = skipped;
                Study::new(report.sequence, masks)
            }
            None => Study::without_masks(report.sequence),
        };

        self.study = study;
        self.playback.reset(self.study.len());
        Ok(summary)
    }

    /// Load slices (and masks) from directories using the DICOM decoder
    pub fn load_from_directories(
        &mut self,
        slices: impl AsRef<Path>,
        masks: Option<&Path>,
    ) -> Result<LoadSummary, SliceStoreError> {
        let slice_entries = read_directory(slices)?;
        let mask_entries = masks.map(read_directory).transpose()?;
        self.load(&slice_entries, mask_entries.as_deref(), &DicomDecoder)
    }

    pub fn current_frame(&self) -> Option<AlignedFrame<'_>> {
        self.study.frame(self.playback.current_index())
    }

    /// Whether every slice has a mask, as overlay and side-by-side review
    /// expect.
    pub fn full_mask_coverage(&self) -> bool {
        !self.study.is_empty() && self.study.mask_count() == self.study.len()
    }

    pub fn render(&self, mode: RenderMode) -> Result<RenderedFrame, RenderError> {
        let frame = self.current_frame().ok_or(RenderError::EmptySession)?;
        let mask = || {
            frame
                .mask
                .map(|mask| &mask.pixels)
                .ok_or(RenderError::MissingMask { index: frame.index })
        };

        match mode {
            RenderMode::Plain => Ok(RenderedFrame::Plain(IntensityTransform::render(frame.slice)?)),
            RenderMode::Overlay => Ok(RenderedFrame::Overlay(OverlayCompositor::composite(
                frame.slice,
                mask()?,
                self.config.overlay_alpha,
                self.config.highlight_color,
            )?)),
            RenderMode::SideBySide => {
                let (slice, mask) = OverlayCompositor::side_by_side(
                    frame.slice,
                    mask()?,
                    self.config.mask_color_mode,
                )?;
                Ok(RenderedFrame::SideBySide { slice, mask })
            }
        }
    }

    /// Readout for a pointer over the current frame displayed at the given
    /// size
    pub fn readout(
        &self,
        pointer_x: f64,
        pointer_y: f64,
        displayed_width: f64,
        displayed_height: f64,
    ) -> Option<PixelReadout> {
        let frame = self.current_frame()?;
        CoordinateMapper::map(
            pointer_x,
            pointer_y,
            displayed_width,
            displayed_height,
            frame.slice,
        )
        .map(|mapping| PixelReadout::new(frame.index, mapping))
    }

    pub fn title(&self) -> String {
        let Some(frame) = self.current_frame() else {
            return "No slices loaded".to_string();
        };
        let mut title = format!("Slice {}/{}", frame.index + 1, self.study.len());
        if let Some(description) = &frame.slice.metadata.series_description {
            title.push_str(" - ");
            title.push_str(description);
        }
        title
    }
}
