// tests/edge_cases.rs
//
// Edge case tests for thumbnail-lab
// Tests boundary values, invalid inputs, and error handling

use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use thumbnail_lab::display::{compression_ratio, format_file_size, DataUrl};
use thumbnail_lab::engine::{
    check_dimensions, decode_image, encode_jpeg, encode_png, plan, resample_image,
    DefaultPipeline, Dimensions, SourceFile, MAX_DIMENSION, MAX_PIXELS,
};
use thumbnail_lab::error::{ErrorCategory, ThumbnailError};
use thumbnail_lab::settings::{OutputFormat, ResampleOptions};

// Helper function to create test images
fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn to_png(img: &DynamicImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

// ============================================================================
// PLANNER BOUNDARIES
// ============================================================================

#[test]
fn test_plan_reference_values() {
    assert_eq!(plan(800, 400, 400), Dimensions::new(400, 200));
    assert_eq!(plan(400, 800, 400), Dimensions::new(200, 400));
    assert_eq!(plan(300, 300, 400), Dimensions::new(300, 300));
    assert_eq!(plan(400, 400, 400), Dimensions::new(400, 400));
}

#[test]
fn test_plan_one_pixel_edges() {
    assert_eq!(plan(1, 1, 400), Dimensions::new(1, 1));
    assert_eq!(plan(1, 5000, 400), Dimensions::new(1, 400));
    assert_eq!(plan(5000, 1, 400), Dimensions::new(400, 1));
    assert_eq!(plan(5000, 5000, 1), Dimensions::new(1, 1));
}

#[test]
fn test_plan_at_dimension_limit() {
    assert_eq!(
        plan(MAX_DIMENSION, MAX_DIMENSION / 2, 400),
        Dimensions::new(400, 200)
    );
}

// ============================================================================
// PIPELINE BOUNDARIES
// ============================================================================

#[tokio::test]
async fn test_single_pixel_source() {
    let pipeline = DefaultPipeline::default();
    let file = SourceFile::new("dot.png", "image/png", to_png(&create_test_image(1, 1)));
    let image = pipeline.process(&file).await.unwrap();
    assert_eq!(image.thumbnail_dimensions, Dimensions::new(1, 1));
}

#[tokio::test]
async fn test_extreme_panorama() {
    let pipeline = DefaultPipeline::default();
    let file = SourceFile::new("pano.png", "image/png", to_png(&create_test_image(4000, 5)));
    let image = pipeline.process(&file).await.unwrap();
    assert_eq!(image.thumbnail_dimensions, Dimensions::new(400, 1));
    let decoded = image::load_from_memory(&image.thumbnail.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (400, 1));
}

#[tokio::test]
async fn test_transparent_source_becomes_opaque_jpeg() {
    let pipeline = DefaultPipeline::default();
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(600, 300, image::Rgba([10, 200, 30, 0])));
    let file = SourceFile::new("ghost.png", "image/png", to_png(&rgba));
    let image = pipeline.process(&file).await.unwrap();
    assert_eq!(image.thumbnail_dimensions, Dimensions::new(400, 200));
    let decoded = image::load_from_memory(&image.thumbnail.bytes).unwrap();
    assert!(!decoded.color().has_alpha());
}

#[tokio::test]
async fn test_source_over_dimension_limit_is_decode_error() {
    let pipeline = DefaultPipeline::default();
    let wide = DynamicImage::ImageLuma8(image::GrayImage::new(MAX_DIMENSION + 1, 1));
    let file = SourceFile::new("too-wide.png", "image/png", to_png(&wide));
    let err = pipeline.process(&file).await.unwrap_err();
    assert!(err.is_decode_error());
    assert!(matches!(err, ThumbnailError::DimensionExceedsLimit { .. }));
    assert_eq!(err.category(), ErrorCategory::ResourceLimit);
}

#[tokio::test]
async fn test_empty_file_is_decode_error() {
    let pipeline = DefaultPipeline::default();
    let err = pipeline
        .process(&SourceFile::new("empty.jpg", "image/jpeg", Vec::new()))
        .await
        .unwrap_err();
    assert!(err.is_decode_error());
}

#[tokio::test]
async fn test_missing_mime_type_still_displays() {
    let pipeline = DefaultPipeline::default();
    let file = SourceFile::new("no-mime", "", to_png(&create_test_image(10, 10)));
    let image = pipeline.process(&file).await.unwrap();
    assert_eq!(image.original.mime_type(), "image/png");
}

// ============================================================================
// LIMITS AND CODECS
// ============================================================================

#[test]
fn test_check_dimensions_limits() {
    assert!(check_dimensions(1, 1).is_ok());
    assert!(check_dimensions(MAX_DIMENSION, 1).is_ok());
    assert!(check_dimensions(MAX_DIMENSION + 1, 1).is_err());
    assert!(check_dimensions(1, MAX_DIMENSION + 1).is_err());

    // 20000 x 6000 = 120 MP, every edge under the dimension limit
    let err = check_dimensions(20_000, 6_000).unwrap_err();
    assert!(matches!(err, ThumbnailError::PixelCountExceedsLimit { max, .. } if max == MAX_PIXELS));
}

#[test]
fn test_decode_rejects_garbage() {
    let err = decode_image(&[0u8; 32]).unwrap_err();
    assert!(err.is_decode_error());
}

#[test]
fn test_resample_zero_target_rejected() {
    let img = create_test_image(10, 10);
    let err = resample_image(&img, Dimensions::new(10, 0), &ResampleOptions::default())
        .unwrap_err();
    assert!(err.is_resample_error());
}

#[test]
fn test_encode_zero_surface_rejected() {
    let img = create_test_image(0, 0);
    assert!(encode_jpeg(&img, 90).unwrap_err().is_encode_error());
    assert!(encode_png(&img).unwrap_err().is_encode_error());
}

#[test]
fn test_unknown_output_mime_rejected() {
    let err = OutputFormat::from_mime("image/bmp", 0.9).unwrap_err();
    assert!(err.is_encode_error());
}

// ============================================================================
// DISPLAY HELPERS
// ============================================================================

#[test]
fn test_file_size_boundaries() {
    assert_eq!(format_file_size(0), "0 B");
    assert_eq!(format_file_size(1), "1 B");
    assert_eq!(format_file_size(1023), "1023 B");
    assert_eq!(format_file_size(1024), "1 KB");
    assert_eq!(format_file_size(1024 * 1024 - 1), "1024 KB");
}

#[test]
fn test_compression_ratio_edges() {
    assert_eq!(compression_ratio(0, 0), 0.0);
    assert_eq!(compression_ratio(100, 100), 0.0);
    assert_eq!(compression_ratio(100, 0), 100.0);
}

#[test]
fn test_empty_data_url_payload() {
    let url = DataUrl::encode("application/octet-stream", &[]);
    assert_eq!(url.as_str(), "data:application/octet-stream;base64,");
    assert_eq!(url.decode().unwrap(), Vec::<u8>::new());
}
