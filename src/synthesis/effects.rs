//! Photographic effect primitives: grain, vignette and bokeh
//!
//! Every primitive takes ownership of a raster and hands it back, so
//! effects chain without cloning.

use super::random::RandomSource;
use crate::types::Color;
use image::{imageops, GrayImage, Luma, RgbImage};

/// Smallest bokeh disc radius in pixels
pub const BOKEH_MIN_RADIUS: i32 = 20;

/// Add uniform integer noise in `[-amount, amount]` to every channel
pub fn grain(mut image: RgbImage, amount: i32, rng: &mut dyn RandomSource) -> RgbImage {
    let amount = amount.abs();
    if amount == 0 {
        return image;
    }

    for value in image.iter_mut() {
        let noisy = i32::from(*value) + rng.int_inclusive(-amount, amount);
        *value = noisy.clamp(0, 255) as u8;
    }
    image
}

/// Darken the image toward its edges
///
/// The mask is 255 inside a centered circle of radius
/// `(width + height) / 2 * darkness` and 0 outside, softened by a Gaussian
/// blur of `blur_radius`. Output is `image * mask / 255`.
pub fn vignette(mut image: RgbImage, blur_radius: f32, darkness: f32) -> RgbImage {
    let mask = vignette_mask(image.width(), image.height(), blur_radius, darkness);

    for (pixel, weight) in image.pixels_mut().zip(mask.pixels()) {
        let weight = u16::from(weight.0[0]);
        for channel in &mut pixel.0 {
            *channel = ((u16::from(*channel) * weight + 127) / 255) as u8;
        }
    }
    image
}

/// Blurred single-channel vignette mask
pub(crate) fn vignette_mask(width: u32, height: u32, blur_radius: f32, darkness: f32) -> GrayImage {
    let radius = (f64::from(width) + f64::from(height)) / 2.0 * f64::from(darkness.max(0.0));
    let radius_sq = radius * radius;
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);

    let mask = GrayImage::from_fn(width, height, |x, y| {
        let dx = f64::from(x) + 0.5 - cx;
        let dy = f64::from(y) + 0.5 - cy;
        if dx * dx + dy * dy <= radius_sq {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    if blur_radius > 0.0 && width > 0 && height > 0 {
        imageops::fast_blur(&mask, blur_radius)
    } else {
        mask
    }
}

/// Scatter `count` translucent white discs over the image
///
/// Positions are uniform over the canvas and radii uniform in
/// `[BOKEH_MIN_RADIUS, max_radius]`; `opacity` is the 0-255 blend weight.
pub fn bokeh(
    mut image: RgbImage,
    count: usize,
    max_radius: i32,
    opacity: u8,
    rng: &mut dyn RandomSource,
) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image;
    }

    let max_radius = max_radius.max(BOKEH_MIN_RADIUS);
    for _ in 0..count {
        let cx = rng.int_inclusive(0, width as i32 - 1);
        let cy = rng.int_inclusive(0, height as i32 - 1);
        let radius = rng.int_inclusive(BOKEH_MIN_RADIUS, max_radius);
        paint_disc(&mut image, (cx, cy), radius, Color::WHITE, opacity);
    }
    image
}

/// Alpha-blend a filled disc onto the image, clipped to its bounds
pub(crate) fn paint_disc(
    image: &mut RgbImage,
    center: (i32, i32),
    radius: i32,
    color: Color,
    opacity: u8,
) {
    let (width, height) = image.dimensions();
    let (cx, cy) = center;
    let x0 = (cx - radius).max(0);
    let y0 = (cy - radius).max(0);
    let x1 = (cx + radius).min(width as i32 - 1);
    let y1 = (cy + radius).min(height as i32 - 1);
    let alpha = u16::from(opacity);
    let radius_sq = i64::from(radius) * i64::from(radius);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let (dx, dy) = (i64::from(x - cx), i64::from(y - cy));
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            for (channel, paint) in pixel.0.iter_mut().zip(color.channels()) {
                *channel =
                    ((u16::from(*channel) * (255 - alpha) + u16::from(paint) * alpha + 127) / 255)
                        as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::random::seeded;
    use image::Rgb;

    #[test]
    fn test_grain_stays_within_amount() {
        let base = RgbImage::from_pixel(16, 16, Rgb([100, 3, 252]));
        let noisy = grain(base.clone(), 5, &mut seeded(9));
        for (before, after) in base.iter().zip(noisy.iter()) {
            let diff = (i32::from(*after) - i32::from(*before)).abs();
            assert!(diff <= 5);
        }
        assert_ne!(base, noisy);
    }

    #[test]
    fn test_grain_clamps() {
        let base = RgbImage::from_pixel(8, 8, Rgb([0, 255, 0]));
        let noisy = grain(base, 50, &mut seeded(3));
        assert!(noisy.pixels().all(|p| p.0[1] >= 205));
        assert!(noisy.pixels().all(|p| p.0[0] <= 50));
    }

    #[test]
    fn test_grain_zero_amount_is_identity() {
        let base = RgbImage::from_pixel(4, 4, Rgb([12, 34, 56]));
        assert_eq!(grain(base.clone(), 0, &mut seeded(1)), base);
    }

    #[test]
    fn test_vignette_full_darkness_keeps_image() {
        let base = RgbImage::from_pixel(64, 48, Rgb([200, 150, 100]));
        let once = vignette(base.clone(), 10.0, 1.0);
        let twice = vignette(once, 10.0, 1.0);
        for (a, b) in base.pixels().zip(twice.pixels()) {
            for c in 0..3 {
                assert!((i32::from(a.0[c]) - i32::from(b.0[c])).abs() <= 4);
            }
        }
    }

    #[test]
    fn test_vignette_tiny_darkness_is_nearly_black() {
        let base = RgbImage::from_pixel(101, 101, Rgb([255, 255, 255]));
        let dark = vignette(base, 1.0, 0.01);
        assert_eq!(dark.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(dark.get_pixel(100, 100).0, [0, 0, 0]);
        assert_eq!(dark.get_pixel(50, 0).0, [0, 0, 0]);
        assert!(dark.get_pixel(50, 50).0[0] > 0);

        let lit = dark.pixels().filter(|p| p.0[0] > 0).count();
        assert!(lit < 200, "expected a pinpoint, found {} lit pixels", lit);
    }

    #[test]
    fn test_vignette_darkens_corners_more_than_center() {
        let base = RgbImage::from_pixel(80, 100, Rgb([180, 180, 180]));
        let out = vignette(base, 12.0, 0.38);
        let center = out.get_pixel(40, 50).0[0];
        let corner = out.get_pixel(0, 0).0[0];
        assert!(center > corner);
        assert!(center > 150);
    }

    #[test]
    fn test_bokeh_only_brightens() {
        let base = RgbImage::from_pixel(120, 90, Rgb([40, 60, 80]));
        let out = bokeh(base.clone(), 12, 80, 55, &mut seeded(5));
        assert!(base
            .iter()
            .zip(out.iter())
            .all(|(before, after)| after >= before));
        assert!(out.pixels().any(|p| p.0 != [40, 60, 80]));
    }

    #[test]
    fn test_paint_disc_clips_to_canvas() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        paint_disc(&mut image, (-3, -3), 5, Color::WHITE, 255);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(9, 9).0, [0, 0, 0]);
    }
}
