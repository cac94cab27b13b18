use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

/// Uploads above this size are accepted but logged.
pub const SIZE_GUIDELINE_BYTES: usize = 10 * 1024 * 1024;

/// Formats the editor opens.
pub const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

/// File picker filter.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("the file is empty")]
    Empty,

    #[error("not an image file ({0})")]
    NotAnImage(String),

    #[error("unsupported image format")]
    Unsupported,

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decoded upload. Never modified after loading.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: RgbaImage,
    pub format: ImageFormat,
    pub byte_len: usize,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Validates and decodes an uploaded file. `mime`, when the caller knows
/// it, must be an `image/*` type.
pub fn load_bytes(bytes: &[u8], mime: Option<&str>) -> Result<SourceImage, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if let Some(mime) = mime {
        if !mime.starts_with("image/") {
            return Err(UploadError::NotAnImage(mime.to_string()));
        }
    }

    let format = image::guess_format(bytes).map_err(|_| UploadError::Unsupported)?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(UploadError::Unsupported);
    }
    if bytes.len() > SIZE_GUIDELINE_BYTES {
        tracing::warn!(bytes = bytes.len(), "upload exceeds the 10 MB guideline");
    }

    let pixels = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
    tracing::info!(
        format = ?format,
        width = pixels.width(),
        height = pixels.height(),
        "image loaded"
    );
    Ok(SourceImage {
        pixels,
        format,
        byte_len: bytes.len(),
    })
}

pub fn load_path(path: &Path) -> Result<SourceImage, UploadError> {
    let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_bytes(&bytes, None)
}
