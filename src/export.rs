use std::io::Write;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use thiserror::Error;

pub const DEFAULT_FILE_NAME: &str = "social-profile-image.png";
pub const DEFAULT_COMPRESSION: u8 = 6;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the canvas is empty")]
    EmptyCanvas,

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn encode_into<W: Write>(canvas: &RgbaImage, writer: W, compression: u8) -> Result<(), ExportError> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(ExportError::EmptyCanvas);
    }
    let encoder = PngEncoder::new_with_quality(
        writer,
        CompressionType::Level(compression.min(9)),
        FilterType::Adaptive,
    );
    canvas.write_with_encoder(encoder)?;
    Ok(())
}

/// Encodes the rendered canvas as PNG; `compression` is a 0..=9 level.
pub fn encode_png(canvas: &RgbaImage, compression: u8) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    encode_into(canvas, &mut bytes, compression)?;
    Ok(bytes)
}

/// Writes the canvas to `dir/file_name`, creating `dir` when missing.
pub fn write_png(
    canvas: &RgbaImage,
    dir: &Path,
    file_name: &str,
    compression: u8,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(file_name);
    let io_err = |source| ExportError::Write {
        path: path.clone(),
        source,
    };
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(ExportError::EmptyCanvas);
    }
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let file = std::fs::File::create(&path).map_err(io_err)?;
    let mut writer = std::io::BufWriter::new(file);
    encode_into(canvas, &mut writer, compression)?;
    writer.flush().map_err(io_err)?;

    tracing::info!(path = %path.display(), width = canvas.width(), height = canvas.height(), "exported PNG");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba, RgbaImage};

    use super::{DEFAULT_COMPRESSION, ExportError, encode_png, write_png};

    fn canvas() -> RgbaImage {
        ImageBuffer::from_fn(5, 4, |x, y| Rgba([x as u8 * 50, y as u8 * 60, 200, (x * 40 + 15) as u8]))
    }

    #[test]
    fn exported_png_decodes_to_the_canvas() {
        let bytes = encode_png(&canvas(), DEFAULT_COMPRESSION).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, canvas());
    }

    #[test]
    fn empty_canvas_is_an_error() {
        let empty = RgbaImage::new(0, 0);
        assert!(matches!(encode_png(&empty, 6), Err(ExportError::EmptyCanvas)));
    }

    #[test]
    fn writes_named_file() {
        let dir = std::env::temp_dir().join(format!("profile-editor-export-{}", std::process::id()));
        let path = write_png(&canvas(), &dir, "out.png", 9).unwrap();
        assert_eq!(path, dir.join("out.png"));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, canvas());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
