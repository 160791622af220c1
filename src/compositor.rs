//! Cutout-over-backdrop compositing
//!
//! The compositor only knows about [`BackdropSource`]: a flat color, an
//! arbitrary decoded image, or a rendered [`Backdrop`]. It never calls the
//! synthesizer itself.

use crate::{
    error::{Result, StudioError},
    types::{Backdrop, Color},
};
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, RgbImage, RgbaImage};
use tracing::debug;

/// What to paint behind the subject
#[derive(Debug, Clone, Copy)]
pub enum BackdropSource<'a> {
    /// Flat fill
    Color(Color),
    /// Any decoded image, resized to the photo
    Image(&'a DynamicImage),
    /// A synthesized backdrop, resized to the photo
    Backdrop(&'a Backdrop),
}

/// Merges cutouts with backdrops at the original photo's resolution
pub struct Compositor;

impl Compositor {
    /// Composite `cutout` over `backdrop`, sized to `original`
    ///
    /// With no backdrop the cutout is returned unchanged (remove-only mode).
    /// Otherwise the result is an RGB image exactly as large as `original`.
    ///
    /// # Errors
    /// - `ImageDecode` when any input raster has a zero dimension
    pub fn composite(
        original: &DynamicImage,
        cutout: &DynamicImage,
        backdrop: Option<BackdropSource<'_>>,
    ) -> Result<DynamicImage> {
        let Some(source) = backdrop else {
            return Ok(cutout.clone());
        };

        let (width, height) = original.dimensions();
        ensure_non_empty("original", width, height)?;
        ensure_non_empty("cutout", cutout.width(), cutout.height())?;

        let base = Self::resolve_backdrop(width, height, source)?;
        let cutout = cutout.to_rgba8();
        debug!(
            width,
            height,
            cutout_width = cutout.width(),
            cutout_height = cutout.height(),
            "Compositing cutout over backdrop"
        );

        Ok(DynamicImage::ImageRgb8(Self::merge(base, &cutout)))
    }

    /// Produce an RGB canvas of exactly `width` x `height` from the source
    ///
    /// Images are stretched with a Lanczos filter rather than cropped, so the
    /// backdrop always covers the whole frame.
    pub fn resolve_backdrop(
        width: u32,
        height: u32,
        source: BackdropSource<'_>,
    ) -> Result<RgbImage> {
        ensure_non_empty("target", width, height)?;

        match source {
            BackdropSource::Color(color) => Ok(RgbImage::from_pixel(width, height, color.to_rgb())),
            BackdropSource::Image(image) => {
                ensure_non_empty("backdrop image", image.width(), image.height())?;
                if image.dimensions() == (width, height) {
                    return Ok(image.to_rgb8());
                }
                Ok(image
                    .resize_exact(width, height, FilterType::Lanczos3)
                    .into_rgb8())
            },
            BackdropSource::Backdrop(backdrop) => {
                let raster = backdrop.as_image();
                ensure_non_empty("backdrop", raster.width(), raster.height())?;
                if raster.dimensions() == (width, height) {
                    return Ok(raster.clone());
                }
                Ok(imageops::resize(raster, width, height, FilterType::Lanczos3))
            },
        }
    }

    /// Blend `cutout` onto `base` anchored at the top-left corner
    ///
    /// Each channel becomes `round(fg * a + bg * (1 - a))` with `a` the
    /// cutout alpha; pixels outside the cutout keep the base color.
    #[must_use]
    pub fn merge(mut base: RgbImage, cutout: &RgbaImage) -> RgbImage {
        let width = base.width().min(cutout.width());
        let height = base.height().min(cutout.height());

        for y in 0..height {
            for x in 0..width {
                let fg = cutout.get_pixel(x, y);
                let alpha = u32::from(fg.0[3]);
                if alpha == 0 {
                    continue;
                }
                let bg = base.get_pixel_mut(x, y);
                for (channel, fg_value) in bg.0.iter_mut().zip(fg.0) {
                    let blended =
                        (u32::from(fg_value) * alpha + u32::from(*channel) * (255 - alpha) + 127) / 255;
                    *channel = blended as u8;
                }
            }
        }
        base
    }
}

fn ensure_non_empty(what: &str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(StudioError::image_decode(format!(
            "{} raster is empty ({}x{})",
            what, width, height
        )));
    }
    Ok(())
}
