// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg) and PNG (image crate)

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::error::{PipelineStage, ThumbnailError};
use crate::settings::OutputFormat;
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::Cursor;

use crate::engine::MAX_DIMENSION;

/// Encode a surface into the requested output format.
pub fn encode(img: &DynamicImage, format: OutputFormat) -> EngineResult<Vec<u8>> {
    match format {
        OutputFormat::Jpeg { quality } => encode_jpeg(img, quality),
        OutputFormat::Png => encode_png(img),
    }
}

/// Encode to JPEG using mozjpeg with web-optimized settings.
///
/// Alpha is dropped; JPEG has no alpha channel.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy(PipelineStage::Encode, "encode:jpeg", || {
        let quality = quality.min(100);

        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        check_encodable("jpeg", w, h)?;

        let expected_len = (w as usize) * (h as usize) * 3;
        if pixels.len() != expected_len {
            return Err(ThumbnailError::encode_failed(
                "jpeg",
                format!("pixel buffer is {} bytes, expected {expected_len}", pixels.len()),
            ));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);

        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);

        // Must come after the scan settings or mozjpeg keeps its default tables.
        let quality_f32 = quality as f32;
        comp.set_quality(quality_f32);

        let smoothing = if quality_f32 >= 90.0 {
            0
        } else if quality_f32 >= 70.0 {
            5
        } else if quality_f32 >= 60.0 {
            10
        } else {
            18
        };
        comp.set_smoothing_factor(smoothing);

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                ThumbnailError::encode_failed(
                    "jpeg",
                    format!("mozjpeg: failed to start compress: {e:?}"),
                )
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    ThumbnailError::encode_failed(
                        "jpeg",
                        format!("mozjpeg: failed to write scanlines: {e:?}"),
                    )
                })?;
            }

            writer.finish().map_err(|e| {
                ThumbnailError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode to PNG using the image crate. Alpha is preserved.
pub fn encode_png(img: &DynamicImage) -> EngineResult<Vec<u8>> {
    run_with_panic_policy(PipelineStage::Encode, "encode:png", || {
        check_encodable("png", img.width(), img.height())?;

        let mut output = Vec::new();
        img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| ThumbnailError::encode_failed("png", e.to_string()))?;
        Ok(output)
    })
}

fn check_encodable(format: &'static str, width: u32, height: u32) -> EngineResult<()> {
    if width == 0 || height == 0 {
        return Err(ThumbnailError::encode_failed(
            format,
            format!("cannot encode a {width}x{height} surface"),
        ));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ThumbnailError::encode_failed(
            format,
            format!("surface {width}x{height} exceeds maximum dimension {MAX_DIMENSION}"),
        ));
    }
    Ok(())
}
