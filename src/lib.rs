//! # slice-review
//!
//! This crate turns a folder of DICOM slices and a folder of segmentation
//! masks into an ordered, windowed and mask-matched sequence of frames for
//! interactive review.

//!
//! It builds on the dicom-rs ecosystem for decoding and on `image` for the
//! rendered output. The pipeline is:
//!  - Loading: every entry is decoded best-effort, undecodable entries are
//!    reported and skipped, survivors are sorted by InstanceNumber
//!  - Windowing: rescale slope/intercept, window center/width and
//!    MONOCHROME1 inversion produce an 8-bit RGB frame
//!  - Mask alignment: a mask's file name (decimal, else hexadecimal) names
//!    the InstanceNumber of its slice
//!  - Compositing: masks are blended in red onto the full-range slice, or
//!    shown in a panel next to the windowed slice
//!  - Navigation: slider jumps, wheel stepping with hysteresis and timed
//!    autoplay that stops at the last frame
//!
//! DICOM files are assumed to have the following attributes:
//!  - One frame per file (always the first frame is used)
//!  - Window center/width present on every slice that should be displayed
//!
//! # Examples
//!
//! ## Reviewing a segmented series
//!
//! Load slices and masks, jump to the middle of the series, and save the
//! overlay of that frame.
//!
//! ```no_run
//! # use slice_review::{config::ViewerConfig, enums::RenderMode, session::{RenderedFrame, ViewerSession}};
//! # use std::path::Path;
//! let mut session = ViewerSession::new(ViewerConfig::default());
//! let summary = session
//!     .load_from_directories("ct", Some(Path::new("masks")))
//!     .expect("should have loaded slices from directory");
//! if let Some(warning) = summary.count_mismatch {
//!     eprintln!("{warning}");
//! }
//! let middle = session.study().len() / 2;
//! session.playback_mut().set_index(middle);
//! if let Ok(RenderedFrame::Overlay(image)) = session.render(RenderMode::Overlay) {
//!     image.save("overlay.png").expect("should have saved overlay");
//! }
//! ```

pub mod config;
pub mod coordinates;
pub mod decode;
pub mod enums;
pub mod intensity;
pub mod mask_aligner;
pub mod overlay;
pub mod playback;
pub mod session;
pub mod slice;
pub mod slice_loader;
pub mod source;
#[cfg(test)]
pub(crate) mod testing;
