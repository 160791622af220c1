//! Per-photo background replacement pipeline
//!
//! `BackgroundReplacementProcessor` owns everything a single item needs:
//! configuration, the matting backend and any user supplied backdrop image.
//! It is immutable after construction and shared across batch workers.

use crate::{
    compositor::{BackdropSource, Compositor},
    config::{BackgroundSpec, OutputFormat, ProcessorConfig},
    error::{Result, StudioError},
    matting::{validate_cutout, MattingBackend},
    services::{
        ImageIOService, NoOpProgressReporter, OutputFormatHandler, ProcessingStage,
        ProgressReporter, ProgressTracker,
    },
    synthesis::{self, random},
    types::{Backdrop, ProcessingTimings},
};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use instant::Instant;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, span, Level};

/// One encoded output image
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    /// Submission index within the batch
    pub index: usize,
    /// Generated output file name
    pub file_name: String,
    /// Encoding of `data`
    pub format: OutputFormat,
    /// Encoded image bytes
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Output width and height
    pub dimensions: (u32, u32),
    /// Per-stage timings
    pub timings: ProcessingTimings,
}

impl ProcessedImage {
    /// Write the encoded bytes into `dir` under the generated name
    pub fn save_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        ImageIOService::save_bytes(&self.data, &path)?;
        Ok(path)
    }
}

/// Build an output file name: `{mode}_{style}_processed_{seq:03}_{suffix}.{ext}`
///
/// `sequence` is 1-based. The suffix is the first 8 hex digits of a random
/// v4 UUID, so names never collide inside an archive.
#[must_use]
pub fn output_file_name(background: &BackgroundSpec, sequence: usize, format: OutputFormat) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    let suffix = uuid.get(..8).unwrap_or(&uuid);
    format!(
        "{}_{}_processed_{:03}_{}.{}",
        background.mode_tag(),
        background.style_slug(),
        sequence,
        suffix,
        format.extension()
    )
}

/// Height after scaling a photo to `max_width`, aspect preserved
///
/// Rounds down like integer pixel math does, but never below one pixel.
#[must_use]
pub fn scaled_height(width: u32, height: u32, max_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(max_width) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Unified background replacement processor
#[derive(Clone)]
pub struct BackgroundReplacementProcessor {
    config: ProcessorConfig,
    matting: Arc<dyn MattingBackend>,
    backdrop_image: Option<Arc<DynamicImage>>,
    reporter: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for BackgroundReplacementProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundReplacementProcessor")
            .field("config", &self.config)
            .field("matting", &self.matting.name())
            .field("has_backdrop_image", &self.backdrop_image.is_some())
            .finish_non_exhaustive()
    }
}

impl BackgroundReplacementProcessor {
    /// Create a processor
    ///
    /// The configuration is validated and a user supplied backdrop image is
    /// loaded once up front.
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Unreadable or undecodable backdrop image
    pub fn new(config: ProcessorConfig, matting: Arc<dyn MattingBackend>) -> Result<Self> {
        config.validate()?;

        let backdrop_image = match &config.background {
            BackgroundSpec::Image { path } => {
                let image = ImageIOService::load_image(path)?;
                debug!(path = %path.display(), dimensions = ?image.dimensions(), "Loaded backdrop image");
                Some(Arc::new(image))
            },
            _ => None,
        };

        info!(
            mode = config.background.mode_tag(),
            matting = matting.name(),
            "Background replacement processor ready"
        );

        Ok(Self {
            config,
            matting,
            backdrop_image,
            reporter: Arc::new(NoOpProgressReporter),
        })
    }

    /// Replace the progress reporter
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub(crate) fn reporter(&self) -> &dyn ProgressReporter {
        self.reporter.as_ref()
    }

    /// Read a file and process it
    pub fn process_file<P: AsRef<Path>>(&self, path: P, index: usize) -> Result<ProcessedImage> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| StudioError::file_io_error("read input", path, &e))?;
        self.process_bytes(&bytes, index)
    }

    /// Run the full pipeline on encoded image bytes
    ///
    /// decode, optional downscale, matting, backdrop, composite, encode.
    ///
    /// # Errors
    /// - `ImageDecode` for unreadable input
    /// - `MattingFailure` from the backend or a wrong-shaped cutout
    /// - `InvalidSize` for a studio request with a bad size
    #[instrument(skip(self, bytes), fields(mode = self.config.background.mode_tag(), input_bytes = bytes.len()))]
    pub fn process_bytes(&self, bytes: &[u8], index: usize) -> Result<ProcessedImage> {
        let mut tracker = ProgressTracker::new(self.reporter.as_ref(), index);
        let result = self.run_pipeline(bytes, index, &mut tracker);
        if let Err(e) = &result {
            tracker.report_error(&e.to_string());
        }
        result
    }

    fn run_pipeline(
        &self,
        bytes: &[u8],
        index: usize,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<ProcessedImage> {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::default();

        tracker.report_stage(ProcessingStage::ImageLoading);
        let stage_start = Instant::now();
        let decoded = ImageIOService::load_from_bytes(bytes)?;
        let decoded = if self.matting.uses_source_alpha() || !decoded.color().has_alpha() {
            decoded
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };
        timings.decode_ms = elapsed_ms(stage_start);

        let photo = match self.config.max_width {
            Some(max_width) => {
                tracker.report_stage(ProcessingStage::Resizing);
                let stage_start = Instant::now();
                let resized = self.downscale(&decoded, max_width);
                timings.resize_ms = elapsed_ms(stage_start);
                resized
            },
            None => decoded,
        };

        tracker.report_stage(ProcessingStage::Matting);
        let cutout = {
            let _span = span!(Level::INFO, "matting", backend = self.matting.name()).entered();
            let stage_start = Instant::now();
            let cutout = self.matting.remove_background(&photo)?;
            validate_cutout(&photo, &cutout)?;
            timings.matting_ms = elapsed_ms(stage_start);
            DynamicImage::ImageRgba8(cutout)
        };

        tracker.report_stage(ProcessingStage::BackdropSynthesis);
        let stage_start = Instant::now();
        let backdrop = self.prepare_backdrop(index)?;
        timings.backdrop_ms = elapsed_ms(stage_start);

        let composite = if self.config.background.composites() {
            tracker.report_stage(ProcessingStage::Compositing);
            let _span = span!(Level::DEBUG, "compositing", width = photo.width(), height = photo.height()).entered();
            let stage_start = Instant::now();
            let source = match &backdrop {
                PreparedBackdrop::None => None,
                PreparedBackdrop::Color(color) => Some(BackdropSource::Color(*color)),
                PreparedBackdrop::Rendered(backdrop) => Some(BackdropSource::Backdrop(backdrop)),
                PreparedBackdrop::Image(image) => Some(BackdropSource::Image(image.as_ref())),
            };
            let composite = Compositor::composite(&photo, &cutout, source)?;
            timings.composite_ms = elapsed_ms(stage_start);
            composite
        } else {
            cutout
        };

        tracker.report_stage(ProcessingStage::Encoding);
        let stage_start = Instant::now();
        let format = self.config.effective_output_format();
        if !self.config.background.composites() {
            OutputFormatHandler::validate_for_remove_only(format);
        }
        let output = OutputFormatHandler::convert_format(composite, format);
        let data = OutputFormatHandler::encode(&output, format, self.config.jpeg_quality)?;
        timings.encode_ms = elapsed_ms(stage_start);
        timings.total_ms = elapsed_ms(total_start);

        let processed = ProcessedImage {
            index,
            file_name: output_file_name(&self.config.background, index + 1, format),
            format,
            data,
            dimensions: output.dimensions(),
            timings,
        };
        tracker.report_completion(&processed.timings);
        debug!(
            file_name = %processed.file_name,
            total_ms = processed.timings.total_ms,
            "Item processed"
        );
        Ok(processed)
    }

    fn downscale(&self, image: &DynamicImage, max_width: u32) -> DynamicImage {
        let (width, height) = image.dimensions();
        let new_height = scaled_height(width, height, max_width);
        debug!(width, height, max_width, new_height, "Downscaling photo");
        image.resize_exact(max_width, new_height, FilterType::Lanczos3)
    }

    /// Randomness for one item: `seed + index` when seeded, entropy otherwise
    fn item_rng(&self, index: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => random::seeded(seed.wrapping_add(index as u64)),
            None => random::from_entropy(),
        }
    }

    fn prepare_backdrop(&self, index: usize) -> Result<PreparedBackdrop> {
        Ok(match &self.config.background {
            BackgroundSpec::RemoveOnly => PreparedBackdrop::None,
            BackgroundSpec::Color { color } => PreparedBackdrop::Color(*color),
            BackgroundSpec::Studio(request) => {
                let _span = span!(Level::DEBUG, "synthesis", style = %request.style).entered();
                let backdrop = synthesis::generate(request, &mut self.item_rng(index))?;
                PreparedBackdrop::Rendered(backdrop)
            },
            BackgroundSpec::Preset { preset } => PreparedBackdrop::Rendered(preset.render(None)?),
            BackgroundSpec::Image { path } => {
                let image = self.backdrop_image.clone().ok_or_else(|| {
                    StudioError::processing_stage_error(
                        "backdrop",
                        "backdrop image was not loaded",
                        Some(&path.display().to_string()),
                    )
                })?;
                PreparedBackdrop::Image(image)
            },
        })
    }
}

/// Backdrop resolved for one item
enum PreparedBackdrop {
    None,
    Color(crate::types::Color),
    Rendered(Backdrop),
    Image(Arc<DynamicImage>),
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
