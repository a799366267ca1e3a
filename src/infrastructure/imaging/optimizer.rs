use std::{
    fs,
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
};

use image::{
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
    DynamicImage, ImageReader, Rgba, RgbaImage, RgbImage,
};
use uuid::Uuid;

use crate::{
    imaging::memory::{available_memory, bits_per_pixel, estimate_decode_bytes, fits_in_budget},
    processing_errors::ProcessingError,
};

pub const JPEG_QUALITY: u8 = 85;

const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const ALPHA_MIME_TYPES: [&str; 2] = ["image/png", "image/webp"];

/// Shrinks oversized source images into a temp directory before they are
/// sent to the generation API.
#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    temp_dir: PathBuf,
    memory_budget: u64,
}

impl ImageOptimizer {
    pub fn new(temp_dir: impl Into<PathBuf>, memory_budget: u64) -> Self {
        ImageOptimizer {
            temp_dir: temp_dir.into(),
            memory_budget,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Returns `path` itself when the image is already within limits,
    /// otherwise the path of a new JPEG in the temp directory. The caller
    /// owns that new file.
    pub async fn optimize(
        &self,
        path: &Path,
        max_dimension: u32,
        max_bytes: u64,
    ) -> Result<PathBuf, ProcessingError> {
        let path = path.to_path_buf();
        let temp_dir = self.temp_dir.clone();
        let budget = self.memory_budget;

        tokio::task::spawn_blocking(move || {
            optimize_file(&path, &temp_dir, max_dimension, max_bytes, budget, available_memory)
        })
        .await
        .map_err(|e| ProcessingError::DecodeError(format!("optimizer task failed: {}", e)))?
    }
}

pub fn optimize_file(
    path: &Path,
    temp_dir: &Path,
    max_dimension: u32,
    max_bytes: u64,
    memory_budget: u64,
    available: impl Fn() -> u64,
) -> Result<PathBuf, ProcessingError> {
    let file_size = fs::metadata(path)
        .map_err(|e| ProcessingError::InvalidImage(format!("cannot read {}: {}", path.display(), e)))?
        .len();

    let mime_type = infer::get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let supported = SUPPORTED_MIME_TYPES.contains(&mime_type.as_str());

    let (width, height) = match read_dimensions(path) {
        Ok(dims) => dims,
        Err(_) if !supported => return Err(ProcessingError::UnsupportedFormat(mime_type)),
        Err(e) => return Err(e),
    };

    if width <= max_dimension && height <= max_dimension && file_size < max_bytes {
        return Ok(path.to_path_buf());
    }

    if !supported {
        return Err(ProcessingError::UnsupportedFormat(mime_type));
    }

    let required = estimate_decode_bytes(width, height, bits_per_pixel(&mime_type));
    if !fits_in_budget(required, memory_budget, available()) {
        return Err(ProcessingError::InsufficientMemory { width, height, required });
    }

    let mut reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))?;
    reader.no_limits();
    let source = reader
        .decode()
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))?;

    let (new_width, new_height) = target_dimensions(width, height, max_dimension);

    let resized = if ALPHA_MIME_TYPES.contains(&mime_type.as_str()) {
        resize_with_alpha(&source, new_width, new_height)
    } else {
        source.resize_exact(new_width, new_height, FilterType::CatmullRom).to_rgb8()
    };

    fs::create_dir_all(temp_dir)
        .map_err(|e| ProcessingError::DirectoryNotWritable(format!("{}: {}", temp_dir.display(), e)))?;

    let target = temp_dir.join(format!("optimized_{}.jpg", Uuid::new_v4().simple()));
    if let Err(e) = write_jpeg(&target, &resized) {
        let _ = fs::remove_file(&target);
        return Err(e);
    }

    tracing::debug!(
        source = %path.display(),
        optimized = %target.display(),
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", new_width, new_height),
        "Optimized source image"
    );

    Ok(target)
}

/// Longer side becomes `min(longer, max_dimension)`, the other side is
/// scaled by the same ratio and floored. Neither side drops below 1px.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer == 0 {
        return (1, 1);
    }
    let target_long = longer.min(max_dimension.max(1));

    let scale = |side: u32| -> u32 {
        let scaled = (side as u64 * target_long as u64) / longer as u64;
        (scaled as u32).max(1)
    };

    if width >= height {
        (target_long, scale(height))
    } else {
        (scale(width), target_long)
    }
}

fn resize_with_alpha(source: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let resampled = imageops::resize(&source.to_rgba8(), width, height, FilterType::CatmullRom);
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));
    imageops::replace(&mut canvas, &resampled, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

fn read_dimensions(path: &Path) -> Result<(u32, u32), ProcessingError> {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ProcessingError::DecodeError(e.to_string()))
}

fn write_jpeg(target: &Path, image: &RgbImage) -> Result<(), ProcessingError> {
    let not_writable = |e: String| ProcessingError::DirectoryNotWritable(format!("{}: {}", target.display(), e));

    let file = fs::File::create(target).map_err(|e| not_writable(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| not_writable(e.to_string()))?;
    writer.flush().map_err(|e| not_writable(e.to_string()))
}

/// In-memory JPEG encoding for derived images (thumbnails, placeholders).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ProcessingError> {
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(image)
        .map_err(|e| ProcessingError::StorageWriteError(e.to_string()))?;
    Ok(buffer.into_inner())
}
