//! Image I/O operations service
//!
//! File and byte-level loading and saving, separated from the processing
//! pipeline so it can be tested on its own.

use crate::error::{Result, StudioError};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

/// Input formats accepted by the pipeline
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Falls back to content sniffing when the extension is wrong.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(StudioError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Self::ensure_non_empty(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );
                let data = std::fs::read(path_ref)
                    .map_err(|io_err| StudioError::file_io_error("read image data", path_ref, &io_err))?;
                Self::load_from_bytes(&data).map_err(|content_err| {
                    StudioError::image_decode(format!(
                        "{} (path: {}, {} bytes)",
                        content_err,
                        path_ref.display(),
                        data.len()
                    ))
                })
            },
        }
    }

    /// Decode raw PNG, JPEG or WEBP bytes
    ///
    /// # Errors
    /// - `ImageDecode` for empty, truncated or unrecognized data, and for
    ///   images with a zero dimension
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(StudioError::image_decode("input is empty"));
        }

        let format = image::guess_format(bytes)
            .map_err(|e| StudioError::image_decode(format!("Unrecognized image data: {}", e)))?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) {
            return Err(StudioError::image_decode(format!(
                "Unsupported input format {:?}",
                format
            )));
        }

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| StudioError::image_decode(format!("Failed to decode {:?} data: {}", format, e)))?;
        Self::ensure_non_empty(image)
    }

    /// Write encoded bytes to a file, creating parent directories
    pub fn save_bytes<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StudioError::file_io_error("create output directory", parent, &e))?;
            }
        }

        std::fs::write(path_ref, bytes)
            .map_err(|e| StudioError::file_io_error("write output file", path_ref, &e))?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path_ref.display());
        Ok(())
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    fn ensure_non_empty(image: DynamicImage) -> Result<DynamicImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(StudioError::image_decode(format!(
                "Decoded image is empty ({}x{})",
                width, height
            )));
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_is_supported_format() {
        assert!(ImageIOService::is_supported_format("test.jpg"));
        assert!(ImageIOService::is_supported_format("test.JPEG"));
        assert!(ImageIOService::is_supported_format("test.png"));
        assert!(ImageIOService::is_supported_format("test.webp"));

        assert!(!ImageIOService::is_supported_format("test.tiff"));
        assert!(!ImageIOService::is_supported_format("test.txt"));
        assert!(!ImageIOService::is_supported_format("test"));
    }

    #[test]
    fn test_load_from_bytes_valid() {
        let image = ImageIOService::load_from_bytes(&png_bytes(7, 3)).unwrap();
        assert_eq!(image.dimensions(), (7, 3));
    }

    #[test]
    fn test_load_from_bytes_invalid() {
        for bytes in [&b""[..], &b"not an image"[..], &b"\x89PNG\r\n\x1a\n\0\0"[..]] {
            let err = ImageIOService::load_from_bytes(bytes).unwrap_err();
            assert!(matches!(err, StudioError::ImageDecode(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ImageIOService::load_image("/definitely/not/here.png");
        assert!(matches!(result, Err(StudioError::Io(_))));
    }

    #[test]
    fn test_load_image_with_wrong_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();
        let image = ImageIOService::load_image(&path).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
    }

    #[test]
    fn test_save_bytes_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.bin");
        ImageIOService::save_bytes(b"abc", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }
}
