//! Decode adapters between raw bytes and the core's typed slices and masks.
//!
//! The rest of the crate never touches DICOM attributes directly: every
//! optional attribute is resolved here into [`SliceMetadata`] with its
//! default applied.

use crate::{
    enums::PhotometricPolarity,
    slice::{MaskPixels, Slice, SliceMetadata},
};

use dicom::core::Tag;
use dicom::object::{DefaultDicomObject, from_reader};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption};
use dicom_dictionary_std::tags;
use image::DynamicImage;
use ndarray::{Array2, Array3, Array4, s};
use thiserror::Error;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8] = b"DICM";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),

    #[error("Raster image error: {0}")]
    Raster(#[from] image::ImageError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Unsupported pixel layout {0:?}")]
    UnsupportedLayout(Vec<usize>),

    #[error("Not a DICOM label image ({dicom}) nor a raster image ({raster})")]
    Unrecognized { dicom: String, raster: String },
}

pub trait SliceDecoder {
    fn decode_slice(&self, name: &str, bytes: &[u8]) -> Result<Slice, DecodeError>;
}

pub trait MaskDecoder {
    fn decode_mask(&self, bytes: &[u8]) -> Result<MaskPixels, DecodeError>;
}

/// DICOM decoder for slices; for masks it falls back to common raster
/// formats (PNG, TIFF, ...) when the bytes are not DICOM.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomDecoder;

impl SliceDecoder for DicomDecoder {
    fn decode_slice(&self, name: &str, bytes: &[u8]) -> Result<Slice, DecodeError> {
        let object = Self::read_object(bytes)?;
        let samples = Self::raw_samples(&object)?;
        let shape = samples.shape().to_vec();
        if shape[0] == 0 || shape[3] == 0 {
            return Err(DecodeError::UnsupportedLayout(shape));
        }
        // Only the first frame and first sample are used
        let pixels = samples.slice_move(s![0, .., .., 0]);
        Ok(Slice::new(name, pixels, Self::metadata(&object)))
    }
}

impl MaskDecoder for DicomDecoder {
    fn decode_mask(&self, bytes: &[u8]) -> Result<MaskPixels, DecodeError> {
        match Self::decode_dicom_mask(bytes) {
            Ok(pixels) => Ok(pixels),
            Err(dicom_err) => {
                log::debug!("Mask is not a DICOM label image ({dicom_err}), trying raster");
                Self::decode_raster_mask(bytes).map_err(|raster_err| DecodeError::Unrecognized {
                    dicom: dicom_err.to_string(),
                    raster: raster_err.to_string(),
                })
            }
        }
    }
}

impl DicomDecoder {
    fn read_object(bytes: &[u8]) -> Result<DefaultDicomObject, DecodeError> {
        let body = match bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) {
            Some(magic) if magic == MAGIC => &bytes[PREAMBLE_LEN..],
            _ => bytes,
        };
        Ok(from_reader(body)?)
    }

    /// Stored values as (frames, rows, columns, samples), without modality
    /// or VOI transforms.
    fn raw_samples(object: &DefaultDicomObject) -> Result<Array4<f32>, DecodeError> {
        let pixel_data = object.decode_pixel_data()?;
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        Ok(pixel_data.to_ndarray_with_options::<f32>(&options)?)
    }

    fn metadata(object: &DefaultDicomObject) -> SliceMetadata {
        let defaults = SliceMetadata::default();
        SliceMetadata {
            instance_number: object
                .element(tags::INSTANCE_NUMBER)
                .ok()
                .and_then(|element| element.to_int::<i64>().ok()),
            rescale_slope: first_float(object, tags::RESCALE_SLOPE)
                .unwrap_or(defaults.rescale_slope),
            rescale_intercept: first_float(object, tags::RESCALE_INTERCEPT)
                .unwrap_or(defaults.rescale_intercept),
            window_center: first_float(object, tags::WINDOW_CENTER),
            window_width: first_float(object, tags::WINDOW_WIDTH),
            polarity: text(object, tags::PHOTOMETRIC_INTERPRETATION)
                .map(|value| PhotometricPolarity::from_interpretation(&value))
                .unwrap_or_default(),
            pixel_spacing: pixel_spacing(object).unwrap_or(defaults.pixel_spacing),
            series_description: text(object, tags::SERIES_DESCRIPTION),
        }
    }

    fn decode_dicom_mask(bytes: &[u8]) -> Result<MaskPixels, DecodeError> {
        let object = Self::read_object(bytes)?;
        let samples = Self::raw_samples(&object)?;
        let shape = samples.shape().to_vec();
        match (shape[0], shape[3]) {
            (0, _) => Err(DecodeError::UnsupportedLayout(shape)),
            (_, 1) => Ok(MaskPixels::Gray(
                samples.slice(s![0, .., .., 0]).mapv(clamp_to_u8),
            )),
            (_, 3) => Ok(MaskPixels::Color(
                samples.slice(s![0, .., .., ..]).mapv(clamp_to_u8),
            )),
            _ => Err(DecodeError::UnsupportedLayout(shape)),
        }
    }

    fn decode_raster_mask(bytes: &[u8]) -> Result<MaskPixels, DecodeError> {
        let image = image::load_from_memory(bytes)?;
        let (width, height) = (image.width() as usize, image.height() as usize);
        let pixels = match image {
            DynamicImage::ImageLuma8(buffer) => {
                MaskPixels::Gray(Array2::from_shape_vec((height, width), buffer.into_raw())?)
            }
            DynamicImage::ImageLuma16(buffer) => {
                let values = buffer.into_raw().into_iter().map(narrow_u16).collect();
                MaskPixels::Gray(Array2::from_shape_vec((height, width), values)?)
            }
            DynamicImage::ImageLumaA16(buffer) => {
                let values = buffer.pixels().map(|pixel| narrow_u16(pixel.0[0])).collect();
                MaskPixels::Gray(Array2::from_shape_vec((height, width), values)?)
            }
            DynamicImage::ImageRgb16(buffer) => {
                let values = buffer.into_raw().into_iter().map(narrow_u16).collect();
                MaskPixels::Color(Array3::from_shape_vec((height, width, 3), values)?)
            }
            DynamicImage::ImageRgba16(buffer) => {
                let values = buffer
                    .pixels()
                    .flat_map(|pixel| {
                        let [red, green, blue, _] = pixel.0;
                        [red, green, blue].map(narrow_u16)
                    })
                    .collect();
                MaskPixels::Color(Array3::from_shape_vec((height, width, 3), values)?)
            }
            luma_alpha @ DynamicImage::ImageLumaA8(_) => MaskPixels::Gray(
                Array2::from_shape_vec((height, width), luma_alpha.to_luma8().into_raw())?,
            ),
            other => MaskPixels::Color(Array3::from_shape_vec(
                (height, width, 3),
                other.to_rgb8().into_raw(),
            )?),
        };
        Ok(pixels)
    }
}

/// Labels above 255 saturate instead of wrapping, so a label of 256 still
/// marks its pixel as set rather than reading back as 0.
#[inline]
fn clamp_to_u8(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// 16-bit raster labels keep their value up to 255 and saturate above it.
/// Rescaling to 8 bits would zero every label below 129.
#[inline]
fn narrow_u16(value: u16) -> u8 {
    value.min(u16::from(u8::MAX)) as u8
}

fn first_float(object: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    object
        .element(tag)
        .ok()?
        .to_multi_float64()
        .ok()?
        .first()
        .copied()
}

fn text(object: &DefaultDicomObject, tag: Tag) -> Option<String> {
    object
        .element(tag)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn pixel_spacing(object: &DefaultDicomObject) -> Option<(f64, f64)> {
    let spacing = object
        .element(tags::PIXEL_SPACING)
        .ok()?
        .to_multi_float64()
        .ok()?;
    match spacing.as_slice() {
        [row, column, ..] => Some((*row, *column)),
        _ => None,
    }
}
