//! Array-wide gradient fields
//!
//! Gradients are computed over the whole raster with `ndarray` broadcasting:
//! a ratio field in `[0, 1]` is built first, then each channel is blended
//! from the base color toward a target in a single pass.

use crate::{
    error::{Result, StudioError},
    types::{Color, Size},
};
use image::RgbImage;
use ndarray::{Array1, Array2, Array3, Axis, Zip};

/// Distance-from-center ratio field, clamped to 1 beyond `max_radius`
///
/// Shape is `(height, width)`.
pub(crate) fn radial_ratio(size: Size, center: (u32, u32), max_radius: f64) -> Array2<f64> {
    let (width, height) = size.dimensions();
    let max_radius = max_radius.max(1.0);

    let dx = Array1::from_iter((0..width).map(|x| f64::from(x) - f64::from(center.0)));
    let dy = Array1::from_iter((0..height).map(|y| f64::from(y) - f64::from(center.1)));
    let dx2 = (&dx * &dx).insert_axis(Axis(0));
    let dy2 = (&dy * &dy).insert_axis(Axis(1));

    (&dy2 + &dx2).mapv(|d2| (d2.sqrt() / max_radius).min(1.0))
}

/// Top-to-bottom ratio field, `y / height` on every row
pub(crate) fn vertical_ratio(size: Size) -> Array2<f64> {
    let (width, height) = size.dimensions();
    let rows = Array1::from_iter((0..height).map(|y| f64::from(y) / f64::from(height)))
        .insert_axis(Axis(1));

    Array2::<f64>::zeros((height as usize, width as usize)) + &rows
}

/// Blend `base` toward a per-ratio target color across the whole field
///
/// Each channel is `trunc(base * (1 - r) + target(r) * r)`.
pub(crate) fn blend_toward<F>(ratio: &Array2<f64>, base: Color, target: F) -> Result<RgbImage>
where
    F: Fn(f64) -> [f64; 3],
{
    let (height, width) = ratio.dim();
    let mut pixels = Array3::<u8>::zeros((height, width, 3));

    for (channel, base_value) in base.channels().into_iter().enumerate() {
        let base_value = f64::from(base_value);
        Zip::from(pixels.index_axis_mut(Axis(2), channel))
            .and(ratio)
            .for_each(|out, &r| {
                let toward = target(r).get(channel).copied().unwrap_or(base_value);
                *out = (base_value * (1.0 - r) + toward * r) as u8;
            });
    }

    let (raw, _) = pixels.into_raw_vec_and_offset();
    RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
        StudioError::processing(format!(
            "Gradient buffer does not match {}x{} raster",
            width, height
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: u32, h: u32) -> Size {
        Size::new(w, h).unwrap()
    }

    #[test]
    fn test_radial_ratio_shape_and_range() {
        let ratio = radial_ratio(size(30, 20), (15, 10), 12.0);
        assert_eq!(ratio.dim(), (20, 30));
        assert_eq!(ratio[[10, 15]], 0.0);
        assert_eq!(ratio[[0, 0]], 1.0);
        assert!(ratio.iter().all(|r| (0.0..=1.0).contains(r)));
        // Four pixels right of center at max radius 12
        assert!((ratio[[10, 19]] - 4.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_ratio_rows() {
        let ratio = vertical_ratio(size(3, 4));
        assert_eq!(ratio.dim(), (4, 3));
        for x in 0..3 {
            assert_eq!(ratio[[0, x]], 0.0);
            assert_eq!(ratio[[2, x]], 0.5);
        }
    }

    #[test]
    fn test_blend_toward_truncates() {
        let ratio = vertical_ratio(size(2, 2));
        let image = blend_toward(&ratio, Color::new(135, 206, 250), |_| [235.0; 3]).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 0).0, [135, 206, 250]);
        // 135 * 0.5 + 235 * 0.5 = 185, 206 * 0.5 + 117.5 = 220.5 -> 220
        assert_eq!(image.get_pixel(0, 1).0, [185, 220, 242]);
    }
}
