//! In-memory fixtures shared by the unit tests.

use crate::slice::{Slice, SliceMetadata};

use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject, mem::InMemElement};
use dicom_dictionary_std::tags;
use image::{GrayImage, ImageFormat, RgbImage};
use ndarray::Array2;
use std::io::Cursor;

const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// Encode a 16-bit MONOCHROME2 DICOM file (with preamble). `extra` elements
/// replace or extend the defaults.
pub(crate) fn dicom_bytes(
    rows: u16,
    columns: u16,
    samples: Vec<u16>,
    extra: Vec<InMemElement>,
) -> Vec<u8> {
    let mut object = InMemDicomObject::from_element_iter([
        DataElement::new(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from(CT_IMAGE_STORAGE)),
        DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from("1.2.826.0.1.1")),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
        DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
        DataElement::new(tags::PIXEL_DATA, VR::OW, PrimitiveValue::U16(samples.into())),
    ]);
    for element in extra {
        object.put(element);
    }

    let file = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid("1.2.826.0.1.1"),
        )
        .expect("file meta");
    let mut bytes = Vec::new();
    file.write_all(&mut bytes).expect("write dicom");
    bytes
}

pub(crate) fn instance_number(value: i64) -> InMemElement {
    DataElement::new(
        tags::INSTANCE_NUMBER,
        VR::IS,
        PrimitiveValue::from(value.to_string()),
    )
}

pub(crate) fn ds(tag: Tag, value: &str) -> InMemElement {
    DataElement::new(tag, VR::DS, PrimitiveValue::from(value))
}

pub(crate) fn ds_list(tag: Tag, values: &[&str]) -> InMemElement {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    DataElement::new(tag, VR::DS, PrimitiveValue::Strs(values.into()))
}

pub(crate) fn png_gray_bytes(width: u32, height: u32, data: Vec<u8>) -> Vec<u8> {
    let image = GrayImage::from_raw(width, height, data).expect("gray image");
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

pub(crate) fn png_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Vec<u8> {
    let image = RgbImage::from_raw(width, height, data).expect("rgb image");
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// A slice with a fixed window, built without going through DICOM
pub(crate) fn windowed_slice(
    name: &str,
    instance_number: Option<i64>,
    pixels: Array2<f32>,
    center: f64,
    width: f64,
) -> Slice {
    Slice::new(
        name,
        pixels,
        SliceMetadata {
            instance_number,
            window_center: Some(center),
            window_width: Some(width),
            ..SliceMetadata::default()
        },
    )
}
