//! Static color and style tables
//!
//! Both tables are process-wide constants. Lookup helpers never allocate
//! and never mutate; the lenient variants log a warning instead of failing.

use crate::{
    error::{Result, StudioError},
    types::{Color, Size},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named preset colors, in display order
pub static COLOR_PRESETS: [(&str, Color); 15] = [
    ("White", Color::new(255, 255, 255)),
    ("Light Blue", Color::new(135, 206, 250)),
    ("Light Gray", Color::new(200, 200, 200)),
    ("Pastel Pink", Color::new(255, 182, 193)),
    ("Pastel Green", Color::new(152, 251, 152)),
    ("Red", Color::new(220, 60, 60)),
    ("Royal Blue", Color::new(65, 105, 225)),
    ("Olive", Color::new(128, 128, 64)),
    ("Purple", Color::new(128, 0, 128)),
    ("Black", Color::new(10, 10, 10)),
    ("Navy Blue", Color::new(0, 0, 128)),
    ("Forest Green", Color::new(34, 139, 34)),
    ("Maroon", Color::new(128, 0, 0)),
    ("Teal", Color::new(0, 128, 128)),
    ("Orange", Color::new(255, 165, 0)),
];

/// Look up a preset color by its exact display name
#[must_use]
pub fn preset_color(name: &str) -> Option<Color> {
    COLOR_PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, color)| *color)
}

/// Names of all preset colors, in display order
#[must_use]
pub fn available_colors() -> Vec<&'static str> {
    COLOR_PRESETS.iter().map(|(name, _)| *name).collect()
}

/// Resolve the backdrop color for a request
///
/// A supplied custom hex color wins when it parses; otherwise the named
/// preset is used; otherwise white.
#[must_use]
pub fn resolve_color(color_name: Option<&str>, custom_hex: Option<&str>) -> Color {
    if let Some(hex) = custom_hex {
        match Color::from_hex(hex) {
            Ok(color) => return color,
            Err(e) => tracing::warn!(hex, "Ignoring custom color: {}", e),
        }
    }

    match color_name {
        Some(name) => preset_color(name).unwrap_or_else(|| {
            tracing::warn!(color = name, "Unknown color preset, using White");
            Color::WHITE
        }),
        None => Color::WHITE,
    }
}

/// Studio backdrop style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    SolidColor,
    Passport,
    Portrait,
    GroupPhoto,
    ProfessionalHeadshot,
}

/// Static per-style configuration
#[derive(Debug, Clone, Copy)]
pub struct StyleSpec {
    pub style: Style,
    pub name: &'static str,
    pub default_size: Option<Size>,
}

/// The style table, in display order
pub static STYLE_TABLE: [StyleSpec; 5] = [
    StyleSpec {
        style: Style::SolidColor,
        name: "Solid Color",
        default_size: None,
    },
    StyleSpec {
        style: Style::Passport,
        name: "Passport",
        default_size: Some(Size::fixed(413, 531)),
    },
    StyleSpec {
        style: Style::Portrait,
        name: "Portrait",
        default_size: Some(Size::fixed(800, 1000)),
    },
    StyleSpec {
        style: Style::GroupPhoto,
        name: "Group Photo",
        default_size: Some(Size::fixed(1600, 900)),
    },
    StyleSpec {
        style: Style::ProfessionalHeadshot,
        name: "Professional Headshot",
        default_size: Some(Size::fixed(600, 800)),
    },
];

/// Size used for solid color backdrops when the caller gives none
pub const SOLID_COLOR_FALLBACK_SIZE: Size = Size::fixed(800, 1000);

impl Style {
    /// Strict lookup by exact display name
    pub fn from_tag(tag: &str) -> Result<Self> {
        STYLE_TABLE
            .iter()
            .find(|spec| spec.name == tag)
            .map(|spec| spec.style)
            .ok_or_else(|| StudioError::UnknownStyle(tag.to_string()))
    }

    /// Lenient lookup: unknown tags become `SolidColor` with a warning
    ///
    /// This mirrors the behavior existing callers rely on. A strict mode
    /// would surface [`StudioError::UnknownStyle`] instead.
    #[must_use]
    pub fn resolve_lenient(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|e| {
            tracing::warn!(style = tag, "{}, falling back to Solid Color", e);
            Self::SolidColor
        })
    }

    #[must_use]
    pub fn spec(self) -> &'static StyleSpec {
        match self {
            Self::SolidColor => &STYLE_TABLE[0],
            Self::Passport => &STYLE_TABLE[1],
            Self::Portrait => &STYLE_TABLE[2],
            Self::GroupPhoto => &STYLE_TABLE[3],
            Self::ProfessionalHeadshot => &STYLE_TABLE[4],
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    #[must_use]
    pub fn default_size(self) -> Option<Size> {
        self.spec().default_size
    }

    /// Lower-case, underscore separated name used in output file names
    #[must_use]
    pub fn slug(self) -> String {
        slugify(self.name())
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s)
    }
}

/// Names of all styles, in display order
#[must_use]
pub fn available_styles() -> Vec<&'static str> {
    STYLE_TABLE.iter().map(|spec| spec.name).collect()
}

pub(crate) fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}
