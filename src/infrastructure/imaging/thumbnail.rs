use std::io::Cursor;

use image::{imageops::FilterType, ImageReader, Rgb, RgbImage};

use crate::{
    imaging::optimizer::{encode_jpeg, JPEG_QUALITY},
    processing_errors::ProcessingError,
};

/// Square, center-cropped JPEG thumbnail.
pub fn thumbnail_jpeg(bytes: &[u8], size: u32) -> Result<Vec<u8>, ProcessingError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))?;
    let thumb = image.resize_to_fill(size, size, FilterType::Lanczos3).to_rgb8();
    encode_jpeg(&thumb, JPEG_QUALITY)
}

/// Plain white JPEG used as the source for text-only generations.
pub fn placeholder_jpeg(size: u32) -> Result<Vec<u8>, ProcessingError> {
    let canvas = RgbImage::from_pixel(size, size, Rgb([255, 255, 255]));
    encode_jpeg(&canvas, 90)
}

pub fn dimensions_from_bytes(bytes: &[u8]) -> Result<(u32, u32), ProcessingError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))
}
