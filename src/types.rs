//! Core value types shared by the synthesizer and the compositor

use crate::error::{Result, StudioError};
use image::{Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Foreground subject with per-pixel alpha, as produced by a matting backend
pub type Cutout = RgbaImage;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` string (leading `#` optional, case-insensitive)
    ///
    /// # Examples
    /// ```rust
    /// use backdrop_studio::Color;
    ///
    /// let color = Color::from_hex("#FF00A0").unwrap();
    /// assert_eq!(color, Color::new(255, 0, 160));
    /// assert!(Color::from_hex("#FFF").is_err());
    /// ```
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StudioError::invalid_color(input));
        }

        let channel = |range: std::ops::Range<usize>| {
            digits
                .get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| StudioError::invalid_color(input))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Format as an upper-case `#RRGGBB` string
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    #[must_use]
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }

    #[must_use]
    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self::new(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Color {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Raster dimensions in pixels, both strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i64, i64)", into = "(i64, i64)")]
pub struct Size {
    width: u32,
    height: u32,
}

impl Size {
    /// Create a size, rejecting zero dimensions
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::from_signed(i64::from(width), i64::from(height))
    }

    /// Create a size from possibly negative user input
    pub fn from_signed(width: i64, height: i64) -> Result<Self> {
        let valid = |v: i64| v > 0 && v <= i64::from(u32::MAX);
        if !valid(width) || !valid(height) {
            return Err(StudioError::invalid_size(width, height));
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
        })
    }

    /// Build a size for compile-time table entries
    ///
    /// Only used with literal, non-zero dimensions.
    pub(crate) const fn fixed(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn width(self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `800x1000`
impl FromStr for Size {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| StudioError::invalid_config(format!("Size '{}' is not WIDTHxHEIGHT", s)))?;
        let parse = |part: &str| {
            part.trim().parse::<i64>().map_err(|_| {
                StudioError::invalid_config(format!("Size '{}' is not WIDTHxHEIGHT", s))
            })
        };
        Self::from_signed(parse(w)?, parse(h)?)
    }
}

impl TryFrom<(i64, i64)> for Size {
    type Error = StudioError;

    fn try_from((width, height): (i64, i64)) -> Result<Self> {
        Self::from_signed(width, height)
    }
}

impl From<Size> for (i64, i64) {
    fn from(size: Size) -> Self {
        (i64::from(size.width), i64::from(size.height))
    }
}

/// A fully rendered RGB backdrop
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    image: RgbImage,
}

impl Backdrop {
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::fixed(self.image.width(), self.image.height())
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Per-stage wall-clock timings for one processed photo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Decoding the input bytes
    pub decode_ms: u64,

    /// Max-width downscale
    pub resize_ms: u64,

    /// Matting backend call
    pub matting_ms: u64,

    /// Resolving or synthesizing the backdrop
    pub backdrop_ms: u64,

    /// Blending the cutout over the backdrop
    pub composite_ms: u64,

    /// Encoding the output image
    pub encode_ms: u64,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    /// Share of the total spent in the matting backend, in percent
    #[must_use]
    pub fn matting_share(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        self.matting_ms as f64 / self.total_ms as f64 * 100.0
    }
}
