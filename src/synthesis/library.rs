//! Built-in library backdrops
//!
//! Generated stand-ins for a preset image library: three soft two-color
//! gradients and a dotted pattern.

use super::{effects::paint_disc, gradient};
use crate::{
    error::{Result, StudioError},
    types::{Backdrop, Color, Size},
};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default size of library backdrops
pub const LIBRARY_DEFAULT_SIZE: Size = Size::fixed(800, 600);

const PATTERN_BASE: Color = Color::new(240, 240, 250);
const PATTERN_DOT: Color = Color::new(200, 200, 230);
const PATTERN_STEP: usize = 50;
const PATTERN_DOT_RADIUS: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LibraryPreset {
    GradientBlue,
    GradientPurple,
    GradientGreen,
    AbstractPattern,
}

impl LibraryPreset {
    pub const ALL: [LibraryPreset; 4] = [
        Self::GradientBlue,
        Self::GradientPurple,
        Self::GradientGreen,
        Self::AbstractPattern,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GradientBlue => "Gradient Blue",
            Self::GradientPurple => "Gradient Purple",
            Self::GradientGreen => "Gradient Green",
            Self::AbstractPattern => "Abstract Pattern",
        }
    }

    /// Top and bottom colors for the gradient presets
    fn gradient_stops(self) -> Option<(Color, Color)> {
        match self {
            Self::GradientBlue => Some((Color::new(100, 150, 255), Color::new(200, 220, 255))),
            Self::GradientPurple => Some((Color::new(150, 100, 255), Color::new(220, 200, 255))),
            Self::GradientGreen => Some((Color::new(100, 255, 150), Color::new(200, 255, 220))),
            Self::AbstractPattern => None,
        }
    }

    /// Render the preset at `size`, or 800x600 when absent
    pub fn render(self, size: Option<Size>) -> Result<Backdrop> {
        let size = size.unwrap_or(LIBRARY_DEFAULT_SIZE);
        let image = match self.gradient_stops() {
            Some((top, bottom)) => {
                let ratio = gradient::vertical_ratio(size);
                let target = bottom.channels().map(f64::from);
                gradient::blend_toward(&ratio, top, |_| target)?
            },
            None => dotted_pattern(size),
        };
        Ok(Backdrop::new(image))
    }
}

fn dotted_pattern(size: Size) -> RgbImage {
    let mut image = RgbImage::from_pixel(size.width(), size.height(), PATTERN_BASE.to_rgb());
    for x in (0..size.width() as i32).step_by(PATTERN_STEP) {
        for y in (0..size.height() as i32).step_by(PATTERN_STEP) {
            paint_disc(
                &mut image,
                (x + PATTERN_DOT_RADIUS, y + PATTERN_DOT_RADIUS),
                PATTERN_DOT_RADIUS,
                PATTERN_DOT,
                255,
            );
        }
    }
    image
}

impl fmt::Display for LibraryPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts display names (`Gradient Blue`) and kebab-case (`gradient-blue`)
impl FromStr for LibraryPreset {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().to_lowercase() == wanted)
            .ok_or_else(|| StudioError::invalid_config(format!("Unknown library preset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_preset_endpoints() {
        let backdrop = LibraryPreset::GradientBlue
            .render(Some(Size::new(10, 100).unwrap()))
            .unwrap();
        let image = backdrop.as_image();
        assert_eq!(image.get_pixel(5, 0).0, [100, 150, 255]);
        // Row 50 is halfway: 150, 185, 255
        assert_eq!(image.get_pixel(5, 50).0, [150, 185, 255]);
    }

    #[test]
    fn test_pattern_has_dots_on_grid() {
        let backdrop = LibraryPreset::AbstractPattern.render(None).unwrap();
        assert_eq!(backdrop.dimensions(), (800, 600));
        let image = backdrop.as_image();
        assert_eq!(image.get_pixel(10, 10).0, [200, 200, 230]);
        assert_eq!(image.get_pixel(60, 60).0, [200, 200, 230]);
        assert_eq!(image.get_pixel(35, 35).0, [240, 240, 250]);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(
            "gradient-purple".parse::<LibraryPreset>().unwrap(),
            LibraryPreset::GradientPurple
        );
        assert_eq!(
            "Abstract Pattern".parse::<LibraryPreset>().unwrap(),
            LibraryPreset::AbstractPattern
        );
        assert!("plaid".parse::<LibraryPreset>().is_err());
    }
}
