//! Studio backdrop synthesis
//!
//! Each [`Style`] maps to one generator. Generators are pure apart from the
//! injected [`RandomSource`]: a gradient field is rendered first, then the
//! effect primitives are applied in a fixed order.
//!
//! ```rust
//! use backdrop_studio::synthesis::{generate, random, BackdropRequest};
//!
//! let request = BackdropRequest::new("Portrait")
//!     .color_name("Light Blue")
//!     .size(400, 500);
//! let backdrop = generate(&request, &mut random::seeded(7)).unwrap();
//! assert_eq!(backdrop.dimensions(), (400, 500));
//! ```

pub mod effects;
pub(crate) mod gradient;
pub mod library;
pub mod random;

pub use effects::{bokeh, grain, vignette};
pub use library::LibraryPreset;
pub use random::RandomSource;

use crate::{
    error::Result,
    presets::{resolve_color, Style, SOLID_COLOR_FALLBACK_SIZE},
    types::{Backdrop, Color, Size},
};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A studio backdrop request as it arrives from a caller
///
/// Style and color are kept as user-facing names; they are resolved
/// leniently when the backdrop is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackdropRequest {
    /// Style display name, e.g. `"Group Photo"`
    pub style: String,
    /// Preset color display name, e.g. `"Light Blue"`
    #[serde(default)]
    pub color_name: Option<String>,
    /// Custom `#RRGGBB` color, preferred over `color_name` when valid
    #[serde(default)]
    pub custom_color: Option<String>,
    /// Explicit `(width, height)`; the style default is used when absent
    #[serde(default)]
    pub size: Option<(i64, i64)>,
}

impl BackdropRequest {
    #[must_use]
    pub fn new<S: Into<String>>(style: S) -> Self {
        Self {
            style: style.into(),
            color_name: None,
            custom_color: None,
            size: None,
        }
    }

    #[must_use]
    pub fn color_name<S: Into<String>>(mut self, name: S) -> Self {
        self.color_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn custom_color<S: Into<String>>(mut self, hex: S) -> Self {
        self.custom_color = Some(hex.into());
        self
    }

    #[must_use]
    pub fn size(mut self, width: i64, height: i64) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Resolved style, falling back to Solid Color for unknown names
    #[must_use]
    pub fn resolved_style(&self) -> Style {
        Style::resolve_lenient(&self.style)
    }

    /// Resolved color: custom, then preset, then white
    #[must_use]
    pub fn resolved_color(&self) -> Color {
        resolve_color(self.color_name.as_deref(), self.custom_color.as_deref())
    }

    /// Validated explicit size, if one was requested
    pub fn resolved_size(&self) -> Result<Option<Size>> {
        self.size
            .map(|(width, height)| Size::from_signed(width, height))
            .transpose()
    }
}

/// Generate a backdrop from a request
///
/// # Errors
/// - `InvalidSize` when the requested size has a non-positive dimension
pub fn generate(request: &BackdropRequest, rng: &mut dyn RandomSource) -> Result<Backdrop> {
    let size = request.resolved_size()?;
    render(request.resolved_style(), request.resolved_color(), size, rng)
}

/// Render a backdrop for an already-resolved style and color
///
/// Without an explicit size the style default applies; Solid Color, which has
/// none, uses 800x1000.
pub fn render(
    style: Style,
    color: Color,
    size: Option<Size>,
    rng: &mut dyn RandomSource,
) -> Result<Backdrop> {
    let size = size
        .or_else(|| style.default_size())
        .unwrap_or(SOLID_COLOR_FALLBACK_SIZE);
    debug!(style = %style, color = %color, size = %size, "Rendering backdrop");

    let image = match style {
        Style::SolidColor => solid_color(color, size),
        Style::Passport => passport(color, size, rng)?,
        Style::Portrait => portrait(color, size, rng)?,
        Style::GroupPhoto => group_photo(color, size, rng)?,
        Style::ProfessionalHeadshot => professional_headshot(color, size, rng)?,
    };
    Ok(Backdrop::new(image))
}

/// Flat canvas filled with `color`
#[must_use]
pub fn solid_color(color: Color, size: Size) -> RgbImage {
    RgbImage::from_pixel(size.width(), size.height(), color.to_rgb())
}

fn max_side(size: Size) -> f64 {
    f64::from(size.width().max(size.height()))
}

fn passport(color: Color, size: Size, rng: &mut dyn RandomSource) -> Result<RgbImage> {
    let highlight = 255.0 * 0.18;
    let center = (size.width() / 2, size.height() / 2);
    let ratio = gradient::radial_ratio(size, center, (max_side(size) / 1.2).floor());
    let image = gradient::blend_toward(&ratio, color, |_| [highlight; 3])?;

    let image = grain(image, 5, rng);
    Ok(vignette(image, 80.0, 0.5))
}

fn portrait(color: Color, size: Size, rng: &mut dyn RandomSource) -> Result<RgbImage> {
    let ratio = gradient::vertical_ratio(size);
    let image = gradient::blend_toward(&ratio, color, |_| [235.0; 3])?;

    let image = grain(image, 7, rng);
    let image = vignette(image, 120.0, 0.38);
    Ok(bokeh(image, 12, 80, 55, rng))
}

fn group_photo(color: Color, size: Size, rng: &mut dyn RandomSource) -> Result<RgbImage> {
    let center = (size.width() / 2, size.height() / 2);
    let ratio = gradient::radial_ratio(size, center, (max_side(size) / 1.6).floor());
    let image = gradient::blend_toward(&ratio, color, |_| [210.0; 3])?;

    let image = grain(image, 6, rng);
    Ok(vignette(image, 140.0, 0.35))
}

fn professional_headshot(color: Color, size: Size, rng: &mut dyn RandomSource) -> Result<RgbImage> {
    // Key light sits in the upper third
    let center = (size.width() / 2, size.height() / 3);
    let ratio = gradient::radial_ratio(size, center, (max_side(size) / 1.8).floor());
    let image = gradient::blend_toward(&ratio, color, |r| {
        let factor = if r < 0.3 { 0.25 } else { 0.1 };
        [255.0 * factor; 3]
    })?;

    let image = grain(image, 4, rng);
    Ok(vignette(image, 100.0, 0.45))
}
