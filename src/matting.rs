//! Matting backends
//!
//! Background removal is an external capability. The pipeline only needs a
//! same-sized RGBA cutout; how it is produced is up to the backend.

use crate::{
    error::{Result, StudioError},
    types::Cutout,
};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::process::Command;
use tracing::{debug, warn};

/// Placeholder replaced by the temporary input path
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by the temporary output path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Produces an RGBA cutout of the foreground subject
pub trait MattingBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Remove the background of `image`
    ///
    /// # Errors
    /// - `MattingFailure` when the backend fails or returns a cutout whose
    ///   dimensions differ from the input
    fn remove_background(&self, image: &DynamicImage) -> Result<Cutout>;

    /// Whether the backend reads the decoded alpha channel
    ///
    /// Backends get an RGB photo unless they return `true` here.
    fn uses_source_alpha(&self) -> bool {
        false
    }
}

/// Check a backend's cutout against its input
pub fn validate_cutout(input: &DynamicImage, cutout: &Cutout) -> Result<()> {
    if input.dimensions() != cutout.dimensions() {
        return Err(StudioError::matting(format!(
            "cutout is {}x{} but the input is {}x{}",
            cutout.width(),
            cutout.height(),
            input.width(),
            input.height()
        )));
    }
    Ok(())
}

/// Uses the input's own alpha channel as the matte
///
/// Meant for photos that were already cut out elsewhere and saved as PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlphaChannelMatting;

impl MattingBackend for AlphaChannelMatting {
    fn name(&self) -> &str {
        "alpha-channel"
    }

    fn uses_source_alpha(&self) -> bool {
        true
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<Cutout> {
        if !image.color().has_alpha() {
            warn!(
                width = image.width(),
                height = image.height(),
                "Input has no alpha channel; the whole frame is treated as foreground"
            );
        }
        let cutout = image.to_rgba8();
        validate_cutout(image, &cutout)?;
        Ok(cutout)
    }
}

/// Runs an external matting tool
///
/// The input is written as PNG into a temporary directory, the command runs
/// with `{input}` and `{output}` substituted, and the PNG it writes is read
/// back as the cutout.
#[derive(Debug, Clone)]
pub struct CommandMatting {
    program: String,
    args: Vec<String>,
}

impl CommandMatting {
    /// Create a backend from a program and its argument template
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Result<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(StudioError::invalid_config("Matting command is empty"));
        }
        for placeholder in [INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
            if !args.iter().any(|arg| arg.contains(placeholder)) {
                return Err(StudioError::invalid_config(format!(
                    "Matting command must reference {}",
                    placeholder
                )));
            }
        }
        Ok(Self { program, args })
    }

    /// Parse a whitespace separated template such as `rembg i {input} {output}`
    pub fn from_template(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| StudioError::invalid_config("Matting command is empty"))?;
        Self::new(program, parts.collect())
    }

    fn substituted_args(&self, input: &str, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, input)
                    .replace(OUTPUT_PLACEHOLDER, output)
            })
            .collect()
    }
}

impl MattingBackend for CommandMatting {
    fn name(&self) -> &str {
        &self.program
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<Cutout> {
        let workdir = tempfile::tempdir()
            .map_err(|e| StudioError::matting(format!("failed to create work directory: {}", e)))?;
        let input_path = workdir.path().join("input.png");
        let output_path = workdir.path().join("output.png");

        image
            .save_with_format(&input_path, ImageFormat::Png)
            .map_err(|e| StudioError::matting(format!("failed to stage input: {}", e)))?;

        let args = self.substituted_args(
            &input_path.to_string_lossy(),
            &output_path.to_string_lossy(),
        );
        debug!(program = %self.program, ?args, "Running matting command");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| StudioError::matting(format!("failed to run '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StudioError::matting(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let cutout = image::open(&output_path)
            .map_err(|e| StudioError::matting(format!("unreadable cutout from '{}': {}", self.program, e)))?
            .to_rgba8();
        validate_cutout(image, &cutout)?;
        Ok(cutout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_alpha_channel_matting_keeps_alpha() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 4, Rgba([1, 2, 3, 40])));
        let cutout = AlphaChannelMatting.remove_background(&input).unwrap();
        assert_eq!(cutout.dimensions(), (5, 4));
        assert_eq!(cutout.get_pixel(2, 2).0, [1, 2, 3, 40]);
    }

    #[test]
    fn test_alpha_channel_matting_opaque_input() {
        let input = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([7, 8, 9])));
        let cutout = AlphaChannelMatting.remove_background(&input).unwrap();
        assert!(cutout.pixels().all(|p| p.0 == [7, 8, 9, 255]));
    }

    #[test]
    fn test_only_alpha_channel_matting_reads_source_alpha() {
        assert!(AlphaChannelMatting.uses_source_alpha());
        let command = CommandMatting::from_template("rembg i {input} {output}").unwrap();
        assert!(!command.uses_source_alpha());
    }

    #[test]
    fn test_validate_cutout_rejects_wrong_shape() {
        let input = DynamicImage::new_rgb8(10, 10);
        let cutout = RgbaImage::new(10, 9);
        assert!(matches!(
            validate_cutout(&input, &cutout),
            Err(StudioError::MattingFailure(_))
        ));
    }

    #[test]
    fn test_command_template_requires_placeholders() {
        assert!(CommandMatting::from_template("rembg i {input} {output}").is_ok());
        assert!(CommandMatting::from_template("rembg i {input}").is_err());
        assert!(CommandMatting::from_template("   ").is_err());
    }

    #[test]
    fn test_command_substitution() {
        let backend = CommandMatting::from_template("tool --in={input} {output}").unwrap();
        assert_eq!(
            backend.substituted_args("/tmp/a.png", "/tmp/b.png"),
            vec!["--in=/tmp/a.png".to_string(), "/tmp/b.png".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_matting_round_trip_with_copy() {
        let backend = CommandMatting::from_template("cp {input} {output}").unwrap();
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 2, Rgba([50, 60, 70, 0])));
        let cutout = backend.remove_background(&input).unwrap();
        assert_eq!(cutout, input.to_rgba8());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_matting_failure_is_matting_error() {
        let backend = CommandMatting::new("false", vec!["{input}".into(), "{output}".into()]).unwrap();
        let input = DynamicImage::new_rgb8(2, 2);
        assert!(matches!(
            backend.remove_background(&input),
            Err(StudioError::MattingFailure(_))
        ));

        let missing = CommandMatting::from_template("definitely-not-a-real-tool-xyz {input} {output}").unwrap();
        assert!(matches!(
            missing.remove_background(&input),
            Err(StudioError::MattingFailure(_))
        ));
    }
}
