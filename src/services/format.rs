//! Output format handling service
//!
//! Keeps encoder selection and alpha handling out of the processor.

use crate::{config::OutputFormat, error::Result, error::StudioError};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Service for encoding processed images
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an image to the pixel layout the format can store
    ///
    /// JPEG drops the alpha channel; PNG keeps the image as is.
    ///
    /// ```rust
    /// use backdrop_studio::{config::OutputFormat, services::OutputFormatHandler};
    /// use image::{DynamicImage, RgbaImage};
    ///
    /// let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
    /// let converted = OutputFormatHandler::convert_format(rgba, OutputFormat::Jpeg);
    /// assert!(converted.as_rgb8().is_some());
    /// ```
    #[must_use]
    pub fn convert_format(image: DynamicImage, format: OutputFormat) -> DynamicImage {
        match format {
            OutputFormat::Png => image,
            OutputFormat::Jpeg => match image {
                DynamicImage::ImageRgb8(_) => image,
                other => DynamicImage::ImageRgb8(other.into_rgb8()),
            },
        }
    }

    /// Encode an image into an in-memory buffer
    ///
    /// `jpeg_quality` is ignored for PNG.
    pub fn encode(image: &DynamicImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Png => {
                image
                    .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                    .map_err(|e| Self::encode_error("PNG", &e))?;
            },
            OutputFormat::Jpeg => {
                let rgb = image.to_rgb8();
                let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality.min(100));
                encoder
                    .encode_image(&rgb)
                    .map_err(|e| Self::encode_error("JPEG", &e))?;
            },
        }
        Ok(buffer)
    }

    /// Get the file extension for a given output format
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        format.extension()
    }

    /// Check if a format supports transparency (alpha channel)
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        matches!(format, OutputFormat::Png)
    }

    /// Warn when a transparent cutout is about to be flattened
    pub fn validate_for_remove_only(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {} does not support transparency. Remove-only results will lose their alpha channel.",
                format
            );
        }
    }

    fn encode_error(format_name: &str, error: &image::ImageError) -> StudioError {
        StudioError::processing_stage_error(
            "encoding",
            &format!("Failed to encode {}: {}", format_name, error),
            None,
        )
    }
}
