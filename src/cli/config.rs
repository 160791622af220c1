//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliMode, CliOutputFormat};
use crate::{
    config::{BackgroundSpec, OutputFormat, ProcessorConfig},
    matting::{AlphaChannelMatting, CommandMatting, MattingBackend},
    synthesis::{BackdropRequest, LibraryPreset},
    types::Color,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Convert CLI arguments to a [`ProcessorConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the processor configuration
    ///
    /// A `--config` file is the base; explicit flags override it.
    pub(crate) fn from_cli(cli: &Cli) -> Result<ProcessorConfig> {
        let mut config = match &cli.config {
            Some(path) => ProcessorConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => ProcessorConfig::default(),
        };

        if cli.config.is_none() || cli.mode.is_some() {
            config.background = Self::background(cli)?;
        }
        if let Some(format) = cli.format {
            config.output_format = Some(match format {
                CliOutputFormat::Png => OutputFormat::Png,
                CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            });
        }
        if cli.config.is_none() || cli.jpeg_quality != crate::config::DEFAULT_JPEG_QUALITY {
            config.jpeg_quality = cli.jpeg_quality;
        }
        if cli.max_width.is_some() {
            config.max_width = cli.max_width;
        }
        if cli.seed.is_some() {
            config.seed = cli.seed;
        }
        if let Some(secs) = cli.timeout {
            config.item_timeout_ms = Some(Duration::from_secs(secs).as_millis() as u64);
        }
        if cli.jobs > 0 {
            config.worker_count = cli.jobs;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Background mode selected by `--mode` and its companion flags
    fn background(cli: &Cli) -> Result<BackgroundSpec> {
        Ok(match cli.mode.unwrap_or(CliMode::RemoveOnly) {
            CliMode::RemoveOnly => BackgroundSpec::RemoveOnly,
            CliMode::Color => BackgroundSpec::Color {
                color: Self::flat_color(cli)?,
            },
            CliMode::Studio => BackgroundSpec::Studio(Self::backdrop_request(cli)),
            CliMode::Preset => BackgroundSpec::Preset {
                preset: cli.preset.unwrap_or(LibraryPreset::GradientBlue),
            },
            CliMode::Image => BackgroundSpec::Image {
                path: cli
                    .background_image
                    .clone()
                    .context("--mode image requires --background-image")?,
            },
        })
    }

    /// Color mode takes a strict hex value, or a preset name resolved leniently
    fn flat_color(cli: &Cli) -> Result<Color> {
        match &cli.hex {
            Some(hex) => Color::from_hex(hex).with_context(|| format!("Invalid --hex value '{}'", hex)),
            None => Ok(crate::presets::resolve_color(cli.color.as_deref(), None)),
        }
    }

    /// Studio request from `--style`, `--color`, `--hex` and `--size`
    pub(crate) fn backdrop_request(cli: &Cli) -> BackdropRequest {
        let mut request = BackdropRequest::new(cli.style.clone());
        if let Some(name) = &cli.color {
            request = request.color_name(name.clone());
        }
        if let Some(hex) = &cli.hex {
            request = request.custom_color(hex.clone());
        }
        if let Some(size) = cli.size {
            request = request.size(i64::from(size.width()), i64::from(size.height()));
        }
        request
    }

    /// Matting backend: an external command when given, otherwise the input's alpha
    pub(crate) fn matting_backend(cli: &Cli) -> Result<Arc<dyn MattingBackend>> {
        Ok(match &cli.matting_command {
            Some(template) => Arc::new(CommandMatting::from_template(template)?),
            None => Arc::new(AlphaChannelMatting),
        })
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.jpeg_quality > 100 {
            anyhow::bail!("JPEG quality must be between 0 and 100, got {}", cli.jpeg_quality);
        }
        if cli.max_width == Some(0) {
            anyhow::bail!("--max-width must be greater than 0");
        }
        if cli.timeout == Some(0) {
            anyhow::bail!("--timeout must be greater than 0");
        }
        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern).with_context(|| format!("Invalid pattern '{}'", pattern))?;
        }
        if cli.mode == Some(CliMode::Image) && cli.background_image.is_none() {
            anyhow::bail!("--mode image requires --background-image");
        }
        if cli.mode == Some(CliMode::Color) {
            Self::flat_color(cli)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["backdrop-studio"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_default_is_remove_only() {
        let config = CliConfigBuilder::from_cli(&parse(&["a.png"])).unwrap();
        assert_eq!(config.background, BackgroundSpec::RemoveOnly);
        assert_eq!(config.effective_output_format(), OutputFormat::Png);
        assert_eq!(config.jpeg_quality, 95);
    }

    #[test]
    fn test_studio_mode_carries_request() {
        let cli = parse(&[
            "a.png", "--mode", "studio", "--style", "Portrait", "--color", "Light Blue", "--size", "400x500",
        ]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        let BackgroundSpec::Studio(request) = config.background else {
            panic!("expected studio background");
        };
        assert_eq!(request.style, "Portrait");
        assert_eq!(request.color_name.as_deref(), Some("Light Blue"));
        assert_eq!(request.size, Some((400, 500)));
    }

    #[test]
    fn test_color_mode() {
        let config = CliConfigBuilder::from_cli(&parse(&["a.png", "--mode", "color", "--hex", "#102030"])).unwrap();
        assert_eq!(
            config.background,
            BackgroundSpec::Color {
                color: Color::new(0x10, 0x20, 0x30)
            }
        );

        let config = CliConfigBuilder::from_cli(&parse(&["a.png", "--mode", "color", "--color", "Black"])).unwrap();
        assert_eq!(config.background, BackgroundSpec::Color { color: Color::new(10, 10, 10) });

        let bad = parse(&["a.png", "--mode", "color", "--hex", "nope"]);
        assert!(CliConfigBuilder::validate_cli(&bad).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "a.png", "--max-width", "640", "--seed", "9", "--timeout", "5", "-j", "3", "--format", "jpeg",
        ]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.max_width, Some(640));
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.item_timeout_ms, Some(5000));
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.output_format, Some(OutputFormat::Jpeg));
    }

    #[test]
    fn test_config_file_is_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"background": {"mode": "preset", "preset": "abstract-pattern"}, "max_width": 320}"#,
        )
        .unwrap();

        let cli = parse(&["a.png", "--config", path.to_str().unwrap(), "--seed", "1"]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(
            config.background,
            BackgroundSpec::Preset {
                preset: LibraryPreset::AbstractPattern
            }
        );
        assert_eq!(config.max_width, Some(320));
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_validation() {
        assert!(CliConfigBuilder::validate_cli(&parse(&["a.png"])).is_ok());
        assert!(CliConfigBuilder::validate_cli(&parse(&["a.png", "--jpeg-quality", "150"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["a.png", "--max-width", "0"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["a.png", "--mode", "image"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["a.png", "--pattern", "[unclosed"])).is_err());
    }

    #[test]
    fn test_matting_backend_selection() {
        let default = CliConfigBuilder::matting_backend(&parse(&["a.png"])).unwrap();
        assert_eq!(default.name(), AlphaChannelMatting.name());

        let cli = parse(&["a.png", "--matting-command", "rembg i {input}"]);
        assert!(CliConfigBuilder::matting_backend(&cli).is_err());
    }
}
