#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Backdrop Studio
//!
//! Studio backdrop synthesis and cutout compositing for batch background
//! replacement.
//!
//! Background removal itself is delegated to a [`MattingBackend`]; this crate
//! generates the replacement backdrop, merges the cutout over it at the
//! photo's resolution and packages the results.
//!
//! ## Features
//!
//! - **Studio Styles**: Solid Color, Passport, Portrait, Group Photo and
//!   Professional Headshot backdrops built from gradients, film grain,
//!   vignette and bokeh
//! - **15 Preset Colors** plus arbitrary `#RRGGBB` colors
//! - **Library Presets**: generated gradient and pattern backdrops
//! - **Reproducible Output**: every random draw goes through a seedable
//!   [`RandomSource`]
//! - **Batch Pipeline**: bounded worker pool with per-item deadlines, results
//!   in submission order, ZIP export
//! - **CLI Integration**: optional command-line interface (`cli` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use backdrop_studio::{
//!     compositor::{BackdropSource, Compositor},
//!     generate_backdrop, BackdropRequest,
//! };
//! use image::{DynamicImage, Rgba, RgbaImage};
//!
//! let request = BackdropRequest::new("Portrait").color_name("Light Blue").size(400, 500);
//! let backdrop = generate_backdrop(&request, Some(42))?;
//!
//! let photo = DynamicImage::new_rgb8(400, 500);
//! let cutout = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 500, Rgba([255, 255, 255, 128])));
//! let composite = Compositor::composite(&photo, &cutout, Some(BackdropSource::Backdrop(&backdrop)))?;
//! assert_eq!(composite.width(), 400);
//! # Ok::<(), backdrop_studio::StudioError>(())
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, progress bars, tracing subscriber
//! - `webp-support` (default): WebP input
//! - `tracing-json`: JSON log output for the CLI

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod matting;
pub mod presets;
pub mod processor;
pub mod services;
pub mod synthesis;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

use std::sync::Arc;

// Public API exports
pub use batch::{process_batch, BatchFailure, BatchInput, BatchOutcome, BatchSuccess};
pub use compositor::{BackdropSource, Compositor};
pub use config::{BackgroundSpec, OutputFormat, ProcessorConfig, ProcessorConfigBuilder};
pub use error::{Result, StudioError};
pub use matting::{AlphaChannelMatting, CommandMatting, MattingBackend};
pub use presets::{available_colors, available_styles, Style, COLOR_PRESETS, STYLE_TABLE};
pub use processor::{BackgroundReplacementProcessor, ProcessedImage};
pub use services::{
    ArchiveService, ConsoleProgressReporter, ImageIOService, NoOpProgressReporter,
    OutputFormatHandler, ProcessingStage, ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use synthesis::{BackdropRequest, LibraryPreset, RandomSource};
pub use types::{Backdrop, Color, Cutout, ProcessingTimings, Size};

/// Render a studio backdrop, optionally from a fixed seed
///
/// Equal requests with equal seeds produce identical backdrops.
pub fn generate_backdrop(request: &BackdropRequest, seed: Option<u64>) -> Result<Backdrop> {
    let mut rng = match seed {
        Some(seed) => synthesis::random::seeded(seed),
        None => synthesis::random::from_entropy(),
    };
    synthesis::generate(request, &mut rng)
}

/// Build a processor from `config` and run a whole batch through it
///
/// # Errors
/// - Invalid configuration or unreadable backdrop image; per-item failures
///   are reported inside the returned [`BatchOutcome`]
pub async fn process_inputs(
    config: ProcessorConfig,
    matting: Arc<dyn MattingBackend>,
    inputs: Vec<BatchInput>,
) -> Result<BatchOutcome> {
    let processor = Arc::new(BackgroundReplacementProcessor::new(config, matting)?);
    Ok(process_batch(processor, inputs).await)
}
