//! Backdrop Studio CLI
//!
//! Command-line interface for batch background replacement and standalone
//! backdrop generation.

use super::config::CliConfigBuilder;
use crate::{
    batch::{process_batch, BatchInput},
    presets::{COLOR_PRESETS, STYLE_TABLE},
    processor::BackgroundReplacementProcessor,
    services::{BatchProgress, ImageIOService, OutputFormatHandler, ProcessingStage, ProgressReporter, ProgressUpdate},
    synthesis::LibraryPreset,
    tracing_config::{init_cli_tracing, spans},
    types::{ProcessingTimings, Size},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

/// Studio backdrop generator and background replacement tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "backdrop-studio")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image files or directories (PNG, JPEG, WEBP)
    #[arg(
        value_name = "INPUT",
        required_unless_present_any = &["list_styles", "list_colors", "list_presets", "generate_backdrop"]
    )]
    pub input: Vec<PathBuf>,

    /// Output directory for processed images
    #[arg(short, long, value_name = "DIR", default_value = "processed")]
    pub output: PathBuf,

    /// Background replacement mode [default: remove-only, or the config file's mode]
    #[arg(short, long, value_enum)]
    pub mode: Option<CliMode>,

    /// Studio style name (studio mode and --generate-backdrop)
    #[arg(long, default_value = "Solid Color")]
    pub style: String,

    /// Preset color name, e.g. "Light Blue"
    #[arg(long)]
    pub color: Option<String>,

    /// Custom color as #RRGGBB (takes precedence over --color)
    #[arg(long, value_name = "HEX")]
    pub hex: Option<String>,

    /// Backdrop size as WIDTHxHEIGHT [default: the style's size]
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub size: Option<Size>,

    /// Library preset (preset mode)
    #[arg(long, value_parser = parse_preset)]
    pub preset: Option<LibraryPreset>,

    /// Backdrop image (image mode)
    #[arg(long, value_name = "PATH")]
    pub background_image: Option<PathBuf>,

    /// Force the output format [default: png for remove-only, jpeg otherwise]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = crate::config::DEFAULT_JPEG_QUALITY)]
    pub jpeg_quality: u8,

    /// Downscale photos to this width before processing
    #[arg(long, value_name = "PX")]
    pub max_width: Option<u32>,

    /// Seed for reproducible backdrops
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-image deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of parallel workers (0 = one per CPU core)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,

    /// External matting command with {input} and {output} placeholders;
    /// without it the input's own alpha channel is used
    #[arg(long, value_name = "TEMPLATE")]
    pub matting_command: Option<String>,

    /// Load processor settings from a JSON file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// File name pattern for directory inputs (e.g. "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Also package all results into a ZIP archive
    #[arg(long, value_name = "PATH")]
    pub zip: Option<PathBuf>,

    /// Write a JSON report of successes and failures
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Render a single backdrop to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub generate_backdrop: Option<PathBuf>,

    /// List studio styles and exit
    #[arg(long)]
    pub list_styles: bool,

    /// List preset colors and exit
    #[arg(long)]
    pub list_colors: bool,

    /// List library presets and exit
    #[arg(long)]
    pub list_presets: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliMode {
    /// Transparent cutout
    RemoveOnly,
    /// Flat color
    Color,
    /// Generated studio backdrop
    Studio,
    /// Library preset
    Preset,
    /// User supplied image
    Image,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
}

fn parse_size(value: &str) -> std::result::Result<Size, String> {
    value.parse::<Size>().map_err(|e| e.to_string())
}

fn parse_preset(value: &str) -> std::result::Result<LibraryPreset, String> {
    value.parse::<LibraryPreset>().map_err(|e| e.to_string())
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.quiet).context("Failed to initialize tracing")?;

    if cli.list_styles {
        list_styles();
        return Ok(());
    }

    if cli.list_colors {
        list_colors();
        return Ok(());
    }

    if cli.list_presets {
        list_presets();
        return Ok(());
    }

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;

    if let Some(path) = &cli.generate_backdrop {
        return generate_backdrop(&cli, path);
    }

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    let matting = CliConfigBuilder::matting_backend(&cli).context("Invalid matting command")?;

    let files = collect_input_files(&cli.input, cli.recursive, cli.pattern.as_deref())?;
    if files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(());
    }
    info!("Found {} image file(s) to process", files.len());

    let mode = config.background.mode_tag();
    let reporter = Arc::new(CliProgressReporter::new(files.len(), cli.quiet, cli.verbose > 0));
    let processor = BackgroundReplacementProcessor::new(config, matting)
        .context("Failed to create background replacement processor")?
        .with_progress_reporter(reporter.clone());

    let inputs = files.into_iter().map(BatchInput::File).collect::<Vec<_>>();
    let inputs_len = inputs.len();
    let outcome = process_batch(Arc::new(processor), inputs)
        .instrument(spans::batch(inputs_len, mode))
        .await;
    reporter.finish(outcome.successes.len(), outcome.failures.len());

    let saved = outcome
        .save_all(&cli.output)
        .with_context(|| format!("Failed to write results to {}", cli.output.display()))?;
    info!("Saved {} file(s) to {}", saved.len(), cli.output.display());

    if let Some(zip_path) = &cli.zip {
        outcome
            .write_archive(zip_path)
            .with_context(|| format!("Failed to write archive {}", zip_path.display()))?;
    }

    if let Some(report_path) = &cli.report {
        outcome
            .write_report(report_path)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    }

    outcome.log_summary();
    if !outcome.is_complete_success() {
        warn!(
            "Some files failed to process. Processed: {}, Failed: {}",
            outcome.successes.len(),
            outcome.failures.len()
        );
    }

    Ok(())
}

/// Render one backdrop without any photo
fn generate_backdrop(cli: &Cli, path: &Path) -> Result<()> {
    let request = CliConfigBuilder::backdrop_request(cli);
    let _span = spans::backdrop_generation(&request.style, request.size).entered();

    let backdrop = crate::generate_backdrop(&request, cli.seed).context("Failed to render backdrop")?;
    let format = match cli.format {
        Some(CliOutputFormat::Jpeg) => crate::config::OutputFormat::Jpeg,
        _ => crate::config::OutputFormat::Png,
    };
    let bytes = OutputFormatHandler::encode(
        &image::DynamicImage::ImageRgb8(backdrop.into_image()),
        format,
        cli.jpeg_quality,
    )?;
    ImageIOService::save_bytes(&bytes, path)
        .with_context(|| format!("Failed to save backdrop to {}", path.display()))?;

    println!("✅ Backdrop written to {}", path.display());
    Ok(())
}

fn list_styles() {
    println!("🎨 Studio Styles");
    for spec in &STYLE_TABLE {
        match spec.default_size {
            Some(size) => println!("  • {} ({})", spec.name, size),
            None => println!("  • {} (any size)", spec.name),
        }
    }
}

fn list_colors() {
    println!("🎨 Preset Colors");
    for (name, color) in &COLOR_PRESETS {
        println!("  • {:<14} {}", name, color);
    }
}

fn list_presets() {
    println!("🖼️  Library Presets");
    for preset in LibraryPreset::ALL {
        println!("  • {}", preset);
    }
}

/// Expand files and directories into a sorted list of supported images
fn collect_input_files(inputs: &[PathBuf], recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in inputs {
        if path.is_file() {
            if ImageIOService::is_supported_format(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            files.extend(find_image_files(path, recursive, pattern)?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    // Sort files alphanumerically for consistent processing order
    files.sort();
    Ok(files)
}

fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && ImageIOService::is_supported_format(path)
            && matches_pattern(path, pattern)
        {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| glob::Pattern::new(pat).is_ok_and(|p| p.matches(name))),
        None => true,
    }
}

/// Progress bar for batches; single items only log
struct CliProgressReporter {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl CliProgressReporter {
    fn new(total: usize, quiet: bool, verbose: bool) -> Self {
        let bar = (!quiet && total > 1).then(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });
        Self { bar, verbose }
    }

    fn finish(&self, processed: usize, failed: usize) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(format!("Completed! Processed: {processed}, Failed: {failed}"));
        }
    }
}

impl ProgressReporter for CliProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose && update.stage == ProcessingStage::Matting {
            log::debug!("[#{}] {}", update.index, update.stage.description());
        }
    }

    fn report_completion(&self, index: usize, timings: &ProcessingTimings) {
        if self.verbose {
            log::debug!("✅ #{} done in {}ms (matting {:.0}%)", index, timings.total_ms, timings.matting_share());
        }
    }

    fn report_error(&self, index: usize, stage: Option<ProcessingStage>, error: &str) {
        let stage = stage.map_or("processing", ProcessingStage::description);
        match &self.bar {
            Some(bar) => bar.println(format!("❌ #{} failed during {}: {}", index, stage, error)),
            None => log::error!("❌ #{} failed during {}: {}", index, stage, error),
        }
    }

    fn report_batch_progress(&self, progress: BatchProgress) {
        if let Some(bar) = &self.bar {
            bar.set_position(progress.completed as u64);
            if progress.failed > 0 {
                bar.set_message(format!("{} failed", progress.failed));
            }
        }
    }
}
