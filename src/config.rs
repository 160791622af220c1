//! Configuration types for background replacement runs

use crate::{
    error::{Result, StudioError},
    presets::Style,
    synthesis::{BackdropRequest, LibraryPreset},
    types::Color,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default JPEG quality for composited output
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG, keeps the cutout's alpha channel
    Png,
    /// JPEG, RGB only
    Jpeg,
}

impl OutputFormat {
    /// File extension without the dot
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(StudioError::invalid_config(format!(
                "Unsupported output format '{}' (expected png or jpeg)",
                other
            ))),
        }
    }
}

/// What replaces the removed background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BackgroundSpec {
    /// Keep the transparent cutout
    #[default]
    RemoveOnly,
    /// Flat color fill
    Color { color: Color },
    /// Generated studio backdrop
    Studio(BackdropRequest),
    /// Built-in library backdrop
    Preset { preset: LibraryPreset },
    /// User supplied backdrop image
    Image { path: PathBuf },
}

impl BackgroundSpec {
    /// Mode tag used in output file names
    #[must_use]
    pub fn mode_tag(&self) -> &'static str {
        match self {
            Self::RemoveOnly => "remove_only",
            Self::Color { .. } => "color_background",
            Self::Studio(_) => "studio_backgrounds",
            Self::Preset { .. } => "preset_backgrounds",
            Self::Image { .. } => "custom_background",
        }
    }

    /// Style slot used in output file names
    ///
    /// Only studio mode names a real style; every other mode reports
    /// `solid_color`.
    #[must_use]
    pub fn style_slug(&self) -> String {
        match self {
            Self::Studio(request) => request.resolved_style().slug(),
            _ => Style::SolidColor.slug(),
        }
    }

    /// Output format when none is forced: PNG for remove only, JPEG otherwise
    #[must_use]
    pub fn default_output_format(&self) -> OutputFormat {
        match self {
            Self::RemoveOnly => OutputFormat::Png,
            _ => OutputFormat::Jpeg,
        }
    }

    /// Whether a backdrop is painted behind the cutout
    #[must_use]
    pub fn composites(&self) -> bool {
        !matches!(self, Self::RemoveOnly)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Studio(request) => request.resolved_size().map(|_| ()),
            Self::Image { path } if path.as_os_str().is_empty() => Err(
                StudioError::invalid_config("Backdrop image path must not be empty"),
            ),
            _ => Ok(()),
        }
    }
}

/// Configuration for a background replacement processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Background replacement mode
    pub background: BackgroundSpec,

    /// Downscale photos to this width before matting (aspect preserved)
    pub max_width: Option<u32>,

    /// Forced output format; the mode decides when unset
    pub output_format: Option<OutputFormat>,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// Base seed for backdrop randomness; item `i` uses `seed + i`
    pub seed: Option<u64>,

    /// Per-item deadline in milliseconds
    pub item_timeout_ms: Option<u64>,

    /// Batch workers (0 = one per available core)
    pub worker_count: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            background: BackgroundSpec::default(),
            max_width: None,
            output_format: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            seed: None,
            item_timeout_ms: None,
            worker_count: 0,
        }
    }
}

impl ProcessorConfig {
    /// Create a new configuration builder
    ///
    /// ```rust
    /// use backdrop_studio::{config::ProcessorConfig, synthesis::BackdropRequest};
    ///
    /// let config = ProcessorConfig::builder()
    ///     .studio(BackdropRequest::new("Passport").color_name("White"))
    ///     .max_width(1024)
    ///     .seed(42)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.background.mode_tag(), "studio_backgrounds");
    /// ```
    #[must_use]
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StudioError::file_io_error("read config", path, &e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            StudioError::invalid_config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - JPEG quality above 100
    /// - Zero max width or zero timeout
    /// - Studio request with a non-positive size
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality > 100 {
            return Err(StudioError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(DEFAULT_JPEG_QUALITY),
            ));
        }

        if self.max_width == Some(0) {
            return Err(StudioError::config_value_error(
                "max width",
                0,
                "1 or more",
                None,
            ));
        }

        if self.item_timeout_ms == Some(0) {
            return Err(StudioError::config_value_error(
                "item timeout (ms)",
                0,
                "1 or more",
                None,
            ));
        }

        self.background.validate()
    }

    /// Output format after applying the mode default
    #[must_use]
    pub fn effective_output_format(&self) -> OutputFormat {
        self.output_format
            .unwrap_or_else(|| self.background.default_output_format())
    }

    /// Per-item deadline, if any
    #[must_use]
    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_ms.map(Duration::from_millis)
    }

    /// Number of batch workers to run
    #[must_use]
    pub fn workers(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }
}

/// Builder for `ProcessorConfig`
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    /// Set the background mode
    #[must_use]
    pub fn background(mut self, background: BackgroundSpec) -> Self {
        self.config.background = background;
        self
    }

    /// Keep the transparent cutout
    #[must_use]
    pub fn remove_only(self) -> Self {
        self.background(BackgroundSpec::RemoveOnly)
    }

    /// Flat color background
    #[must_use]
    pub fn color(self, color: Color) -> Self {
        self.background(BackgroundSpec::Color { color })
    }

    /// Generated studio backdrop
    #[must_use]
    pub fn studio(self, request: BackdropRequest) -> Self {
        self.background(BackgroundSpec::Studio(request))
    }

    /// Built-in library backdrop
    #[must_use]
    pub fn preset(self, preset: LibraryPreset) -> Self {
        self.background(BackgroundSpec::Preset { preset })
    }

    /// User supplied backdrop image
    #[must_use]
    pub fn image<P: Into<PathBuf>>(self, path: P) -> Self {
        self.background(BackgroundSpec::Image { path: path.into() })
    }

    /// Set max width
    #[must_use]
    pub fn max_width(mut self, width: u32) -> Self {
        self.config.max_width = Some(width);
        self
    }

    /// Force an output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = Some(format);
        self
    }

    /// Set JPEG quality
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    /// Seed backdrop randomness
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the per-item deadline
    #[must_use]
    pub fn item_timeout(mut self, timeout: Duration) -> Self {
        self.config.item_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the batch worker count (0 = auto)
    #[must_use]
    pub fn worker_count(mut self, workers: usize) -> Self {
        self.config.worker_count = workers;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ProcessorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
