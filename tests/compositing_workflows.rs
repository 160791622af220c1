//! End-to-end compositing workflows
//!
//! Cutouts are built in memory; matting is the identity on the input's
//! alpha channel, so the composite is fully predictable.

use backdrop_studio::{
    compositor::{BackdropSource, Compositor},
    generate_backdrop, AlphaChannelMatting, BackdropRequest, BackgroundReplacementProcessor,
    Color, OutputFormat, ProcessorConfig, StudioError,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

/// White subject in the middle, transparent border of `border` pixels
fn framed_cutout(width: u32, height: u32, border: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let inside =
            x >= border && y >= border && x < width - border && y < height - border;
        if inside {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_portrait_light_blue_end_to_end() {
    let request = BackdropRequest::new("Portrait")
        .color_name("Light Blue")
        .size(400, 500);
    let backdrop = generate_backdrop(&request, Some(11)).unwrap();

    let cutout = DynamicImage::ImageRgba8(framed_cutout(400, 500, 100));
    let original = DynamicImage::new_rgb8(400, 500);
    let result =
        Compositor::composite(&original, &cutout, Some(BackdropSource::Backdrop(&backdrop))).unwrap();

    assert_eq!(result.dimensions(), (400, 500));
    assert!(!result.color().has_alpha());
    let rgb = result.to_rgb8();

    // Subject stays untouched
    assert_eq!(rgb.get_pixel(200, 250).0, [255, 255, 255]);

    // Backdrop region keeps the light blue cast: blue never trails red by
    // more than grain can explain.
    let mut blue_total = 0u64;
    let mut red_total = 0u64;
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let in_subject = (100..300).contains(&x) && (100..400).contains(&y);
        if in_subject {
            continue;
        }
        let [r, _, b] = pixel.0;
        assert!(u16::from(b) + 16 >= u16::from(r), "({x},{y}) = {:?}", pixel.0);
        blue_total += u64::from(b);
        red_total += u64::from(r);
    }
    assert!(blue_total > red_total);

    // Near the middle of the left margin the vignette has not gone black
    let [r, g, b] = rgb.get_pixel(60, 250).0;
    assert!(u16::from(r) + u16::from(g) + u16::from(b) > 30);
}

#[test]
fn test_color_backdrop_exact_blend_limits() {
    let original = DynamicImage::new_rgb8(8, 6);
    let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([12, 200, 99, 255])));
    let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([12, 200, 99, 0])));
    let black = Some(BackdropSource::Color(Color::BLACK));

    let kept = Compositor::composite(&original, &opaque, black).unwrap().to_rgb8();
    assert!(kept.pixels().all(|p| p.0 == [12, 200, 99]));

    let erased = Compositor::composite(&original, &clear, black).unwrap().to_rgb8();
    assert!(erased.pixels().all(|p| p.0 == [0, 0, 0]));
    assert_eq!(erased.dimensions(), (8, 6));
}

#[test]
fn test_remove_only_returns_cutout() {
    let original = DynamicImage::new_rgb8(5, 5);
    let cutout = DynamicImage::ImageRgba8(framed_cutout(5, 5, 1));
    let result = Compositor::composite(&original, &cutout, None).unwrap();
    assert_eq!(result, cutout);
}

#[test]
fn test_backdrop_image_stretches_to_photo() {
    let original = DynamicImage::new_rgb8(90, 30);
    let backdrop = DynamicImage::new_rgb8(10, 40);
    let cutout = DynamicImage::ImageRgba8(RgbaImage::from_pixel(90, 30, Rgba([0, 0, 0, 0])));

    let result =
        Compositor::composite(&original, &cutout, Some(BackdropSource::Image(&backdrop))).unwrap();
    assert_eq!(result.dimensions(), (90, 30));
}

#[test]
fn test_zero_sized_original_is_decode_error() {
    let original = DynamicImage::new_rgb8(0, 10);
    let cutout = DynamicImage::new_rgba8(4, 4);
    let err = Compositor::composite(&original, &cutout, Some(BackdropSource::Color(Color::WHITE)))
        .unwrap_err();
    assert!(matches!(err, StudioError::ImageDecode(_)));
}

#[test]
fn test_processor_studio_mode_outputs_jpeg_at_photo_size() {
    let config = ProcessorConfig::builder()
        .studio(BackdropRequest::new("Professional Headshot").color_name("Navy Blue"))
        .seed(5)
        .build()
        .unwrap();
    let processor = BackgroundReplacementProcessor::new(config, Arc::new(AlphaChannelMatting)).unwrap();

    let photo = encode_png(&framed_cutout(120, 160, 20));
    let output = processor.process_bytes(&photo, 0).unwrap();

    assert_eq!(output.format, OutputFormat::Jpeg);
    assert_eq!(output.dimensions, (120, 160));
    assert!(output
        .file_name
        .starts_with("studio_backgrounds_professional_headshot_processed_001_"));
    assert!(output.file_name.ends_with(".jpg"));

    let decoded = image::load_from_memory(&output.data).unwrap();
    assert_eq!(decoded.dimensions(), (120, 160));
    assert!(!decoded.color().has_alpha());
}

#[test]
fn test_processor_remove_only_keeps_transparency() {
    let processor =
        BackgroundReplacementProcessor::new(ProcessorConfig::default(), Arc::new(AlphaChannelMatting)).unwrap();

    let photo = encode_png(&framed_cutout(30, 30, 5));
    let output = processor.process_bytes(&photo, 4).unwrap();

    assert_eq!(output.format, OutputFormat::Png);
    assert!(output.file_name.starts_with("remove_only_solid_color_processed_005_"));
    let decoded = image::load_from_memory(&output.data).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    assert_eq!(decoded.get_pixel(15, 15).0, [255, 255, 255, 255]);
}

#[test]
fn test_processor_image_mode_uses_backdrop_file() {
    let dir = tempfile::tempdir().unwrap();
    let backdrop_path = dir.path().join("backdrop.png");
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(16, 16, image::Rgb([0, 128, 0])))
        .save(&backdrop_path)
        .unwrap();

    let config = ProcessorConfig::builder()
        .image(backdrop_path.clone())
        .output_format(OutputFormat::Png)
        .build()
        .unwrap();
    let processor = BackgroundReplacementProcessor::new(config, Arc::new(AlphaChannelMatting)).unwrap();

    let photo = encode_png(&framed_cutout(40, 20, 4));
    let output = processor.process_bytes(&photo, 0).unwrap();
    assert!(output.file_name.starts_with("custom_background_solid_color_processed_001_"));

    let decoded = image::load_from_memory(&output.data).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (40, 20));
    let [r, g, b] = decoded.get_pixel(0, 0).0;
    assert_eq!((r, b), (0, 0));
    assert!((126..=130).contains(&g), "green {g}");
    assert_eq!(decoded.get_pixel(20, 10).0, [255, 255, 255]);
}
