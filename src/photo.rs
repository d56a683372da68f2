//! Photo upload: validation and decoding
//!
//! Uploads are checked before anything is stored: size first (cheap, from
//! file metadata), then the format is sniffed from the leading bytes. Only
//! JPEG, PNG and WebP are accepted. Decoding runs on the blocking pool.

use std::io::Read;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use tokio::task;
use tracing::{info, warn};

/// Upload size limit
pub const MAX_UPLOAD_BYTES: u64 = 12 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type {0}; use a JPEG, PNG or WebP photo")]
    UnsupportedType(String),
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("could not decode photo: {0}")]
    Decode(#[from] image::ImageError),
    #[error("could not read photo: {0}")]
    Io(#[from] std::io::Error),
    #[error("photo loading task failed: {0}")]
    Join(String),
}

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
    WebP,
}

impl PhotoFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "image/jpeg",
            PhotoFormat::Png => "image/png",
            PhotoFormat::WebP => "image/webp",
        }
    }

    /// File extension used for stored originals
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "jpg",
            PhotoFormat::Png => "png",
            PhotoFormat::WebP => "webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            PhotoFormat::Jpeg => ImageFormat::Jpeg,
            PhotoFormat::Png => ImageFormat::Png,
            PhotoFormat::WebP => ImageFormat::WebP,
        }
    }
}

/// A validated, decoded upload
#[derive(Debug, Clone)]
pub struct LoadedPhoto {
    pub file_name: String,
    pub format: PhotoFormat,
    /// Original encoded bytes, stored unchanged
    pub bytes: Vec<u8>,
    pub pixels: RgbaImage,
}

impl LoadedPhoto {
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

fn check_size(size: u64, limit: u64) -> Result<(), UploadError> {
    if size > limit {
        return Err(UploadError::TooLarge { size, limit });
    }
    Ok(())
}

/// Check size and sniff the format of an in-memory upload
pub fn validate(bytes: &[u8], limit: u64) -> Result<PhotoFormat, UploadError> {
    check_size(bytes.len() as u64, limit)?;

    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok(PhotoFormat::Jpeg),
        Ok(ImageFormat::Png) => Ok(PhotoFormat::Png),
        Ok(ImageFormat::WebP) => Ok(PhotoFormat::WebP),
        Ok(other) => Err(UploadError::UnsupportedType(other.to_mime_type().to_string())),
        Err(_) => Err(UploadError::UnsupportedType("unknown".to_string())),
    }
}

/// Decode validated bytes into RGBA8
pub fn decode(bytes: &[u8], format: PhotoFormat) -> Result<RgbaImage, UploadError> {
    let image = image::load_from_memory_with_format(bytes, format.image_format())?;
    Ok(image.to_rgba8())
}

/// Load, validate and decode a photo without blocking the caller
pub async fn load_photo(path: PathBuf, limit: u64) -> Result<LoadedPhoto, UploadError> {
    task::spawn_blocking(move || load_photo_blocking(&path, limit))
        .await
        .map_err(|e| UploadError::Join(e.to_string()))?
}

/// Blocking implementation of photo loading
pub fn load_photo_blocking(path: &Path, limit: u64) -> Result<LoadedPhoto, UploadError> {
    let file = std::fs::File::open(path)?;
    let size = file.metadata()?.len();
    if let Err(e) = check_size(size, limit) {
        warn!(path = %path.display(), size, limit, "upload rejected");
        return Err(e);
    }

    let mut bytes = Vec::with_capacity(size as usize);
    // Guard against the file growing between stat and read
    file.take(limit + 1).read_to_end(&mut bytes)?;

    let format = validate(&bytes, limit)?;
    let pixels = decode(&bytes, format)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());

    info!(
        file = %file_name,
        mime = format.mime(),
        width = pixels.width(),
        height = pixels.height(),
        "photo loaded"
    );

    Ok(LoadedPhoto {
        file_name,
        format,
        bytes,
        pixels,
    })
}
