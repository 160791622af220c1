//! Error types for backdrop synthesis and compositing

use std::time::Duration;
use thiserror::Error;

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Error types raised by the synthesizer, the compositor and the batch pipeline
#[derive(Error, Debug)]
pub enum StudioError {
    /// Hex color string was not exactly six hex digits
    #[error("Invalid color format: '{0}' (expected #RRGGBB)")]
    InvalidColorFormat(String),

    /// Requested raster size had a non-positive dimension
    #[error("Invalid size: {width}x{height} (both dimensions must be positive)")]
    InvalidSize { width: i64, height: i64 },

    /// Style tag did not match any known style
    ///
    /// The synthesizer downgrades this to `SolidColor`; it only surfaces from
    /// strict lookups such as [`crate::presets::Style::from_tag`].
    #[error("Unknown style: '{0}'")]
    UnknownStyle(String),

    /// Input raster could not be decoded or was structurally invalid
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// External matting capability failed or returned an unexpected result
    #[error("Matting failure: {0}")]
    MattingFailure(String),

    /// Item exceeded its processing deadline
    #[error("Processing timed out after {0:?}")]
    Timeout(Duration),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding errors from the image crate
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// ZIP packaging errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic processing failure
    #[error("Processing error: {0}")]
    Processing(String),
}

impl StudioError {
    /// Create a new invalid color format error
    pub fn invalid_color<S: Into<String>>(input: S) -> Self {
        Self::InvalidColorFormat(input.into())
    }

    /// Create a new invalid size error
    #[must_use]
    pub fn invalid_size(width: i64, height: i64) -> Self {
        Self::InvalidSize { width, height }
    }

    /// Create a new image decode error
    pub fn image_decode<S: Into<String>>(msg: S) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Create a new matting failure
    pub fn matting<S: Into<String>>(msg: S) -> Self {
        Self::MattingFailure(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create processing error with stage context
    #[must_use]
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        Self::Io(std::io::Error::new(
            error.kind(),
            format!(
                "Failed to {} '{}': {}",
                operation,
                path.as_ref().display(),
                error
            ),
        ))
    }

    /// Whether resubmitting the same item may succeed
    ///
    /// Matting and deadline failures depend on the external capability;
    /// everything else is a property of the input or the configuration.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MattingFailure(_) | Self::Timeout(_))
    }
}
