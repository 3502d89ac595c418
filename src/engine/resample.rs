// src/engine/resample.rs
//
// Resampler: (surface, target dimensions, options) -> surface of exactly the
// target dimensions. The pipeline only depends on the `Resampler` trait; the
// default implementation is fast_image_resize (SIMD, rayon inside) followed
// by an unsharp mask to recover the edge contrast lost to the lanczos filter.

use async_trait::async_trait;
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Pixel, RgbImage, RgbaImage};
use tracing::trace;

use crate::engine::codec::PixelSurface;
use crate::engine::common::{run_blocking, EngineResult};
use crate::engine::planner::Dimensions;
use crate::error::{PipelineStage, ThumbnailError};
use crate::settings::{ResampleOptions, ResampleQuality, UnsharpMask};

/// High-quality resize capability.
#[async_trait]
pub trait Resampler: Send + Sync {
    /// Resize `source` to exactly `target`. Fails with a resample-stage error.
    async fn resize(
        &self,
        source: &PixelSurface,
        target: Dimensions,
        options: &ResampleOptions,
    ) -> EngineResult<PixelSurface>;
}

#[async_trait]
impl<T: Resampler + ?Sized> Resampler for std::sync::Arc<T> {
    async fn resize(
        &self,
        source: &PixelSurface,
        target: Dimensions,
        options: &ResampleOptions,
    ) -> EngineResult<PixelSurface> {
        (**self).resize(source, target, options).await
    }
}

/// Default resampler backed by fast_image_resize.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirResampler;

impl FirResampler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Resampler for FirResampler {
    async fn resize(
        &self,
        source: &PixelSurface,
        target: Dimensions,
        options: &ResampleOptions,
    ) -> EngineResult<PixelSurface> {
        let image = source.shared();
        let options = *options;
        let resized = run_blocking(PipelineStage::Resample, "resample", move || {
            resample_image(&image, target, &options)
        })
        .await?;
        Ok(PixelSurface::new(resized))
    }
}

/// Synchronous resize + sharpen.
pub fn resample_image(
    img: &DynamicImage,
    target: Dimensions,
    options: &ResampleOptions,
) -> EngineResult<DynamicImage> {
    let src_dims = (img.width(), img.height());
    let dst_dims = (target.width, target.height);

    if dst_dims.0 == 0 || dst_dims.1 == 0 {
        return Err(ThumbnailError::invalid_resize_dimensions(dst_dims.0, dst_dims.1));
    }
    if src_dims.0 == 0 || src_dims.1 == 0 {
        return Err(ThumbnailError::resize_failed(
            src_dims,
            dst_dims,
            "source surface is empty",
        ));
    }

    // Select pixel layout without forcing RGBA when not needed
    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        _ if !options.alpha => (PixelType::U8x3, img.to_rgb8().into_raw()),
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.as_raw().clone()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.as_raw().clone()),
        other if !other.color().has_alpha() => (PixelType::U8x3, other.to_rgb8().into_raw()),
        other => (PixelType::U8x4, other.to_rgba8().into_raw()),
    };

    trace!(
        from = %Dimensions::from(src_dims),
        to = %target,
        quality = options.quality.level(),
        alpha = options.alpha,
        "resampling surface"
    );

    let resized = resize_options(options.quality)
        .and_then(|fir_options| {
            resize_pixels(src_dims, src_pixels, pixel_type, dst_dims, fir_options)
        })
        .map_err(|reason| ThumbnailError::resize_failed(src_dims, dst_dims, reason))?;

    let sharpened = if options.unsharp.is_enabled() {
        apply_unsharp_mask(resized, &options.unsharp)
    } else {
        resized
    };

    if (sharpened.width(), sharpened.height()) != dst_dims {
        return Err(ThumbnailError::resize_failed(
            src_dims,
            dst_dims,
            format!(
                "resampler produced {}x{}",
                sharpened.width(),
                sharpened.height()
            ),
        ));
    }

    Ok(sharpened)
}

fn resize_options(quality: ResampleQuality) -> std::result::Result<ResizeOptions, String> {
    let filter = match quality {
        ResampleQuality::Box => fir::FilterType::Box,
        ResampleQuality::Hamming => fir::FilterType::Hamming,
        ResampleQuality::Lanczos2 => fir::FilterType::Custom(
            fir::Filter::new("Lanczos2", lanczos2_kernel, 2.0)
                .map_err(|e| format!("lanczos2 filter: {e}"))?,
        ),
        ResampleQuality::Lanczos3 => fir::FilterType::Lanczos3,
    };
    Ok(ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(filter)))
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let x = x * std::f64::consts::PI;
        x.sin() / x
    }
}

/// Truncated sinc with two lobes.
fn lanczos2_kernel(x: f64) -> f64 {
    if (-2.0..2.0).contains(&x) {
        sinc(x) * sinc(x / 2.0)
    } else {
        0.0
    }
}

/// Decide whether alpha premultiplication is required for a given pixel layout.
#[inline]
fn requires_premultiply(pixel_type: PixelType) -> bool {
    matches!(pixel_type, PixelType::U8x4)
}

fn resize_pixels(
    (src_width, src_height): (u32, u32),
    mut src_pixels: Vec<u8>,
    pixel_type: PixelType,
    (dst_width, dst_height): (u32, u32),
    options: ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let pixel_count = (src_width as usize)
        .checked_mul(src_height as usize)
        .ok_or_else(|| "image dimensions overflow during resize".to_string())?;
    let required_bytes = pixel_count
        .checked_mul(pixel_type.size())
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "fir source image invalid buffer size. expected {required_bytes} bytes, got {} bytes",
            src_pixels.len()
        ));
    }

    let primary_result = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => {
            resize_with_source_image(src_image, pixel_type, dst_width, dst_height, &options)
        }
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let aligned_image = copy_pixels_to_aligned_image(
                src_width,
                src_height,
                pixel_type,
                &src_pixels,
                required_bytes,
            )?;
            resize_with_source_image(aligned_image, pixel_type, dst_width, dst_height, &options)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary_result {
        Ok(img) => Ok(img),
        Err(err) => resize_with_image_crate_fallback(
            &src_pixels,
            src_width,
            src_height,
            pixel_type,
            dst_width,
            dst_height,
        )
        .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}")),
    }
}

fn copy_pixels_to_aligned_image(
    width: u32,
    height: u32,
    pixel_type: PixelType,
    src_pixels: &[u8],
    required_bytes: usize,
) -> std::result::Result<fir::images::Image<'static>, String> {
    let mut aligned_image = fir::images::Image::new(width, height, pixel_type);
    let aligned_buffer = aligned_image.buffer_mut();
    if aligned_buffer.len() != required_bytes {
        return Err(format!(
            "fir alignment fallback buffer mismatch. expected {required_bytes} bytes, got {} bytes",
            aligned_buffer.len()
        ));
    }
    aligned_buffer.copy_from_slice(&src_pixels[..required_bytes]);
    Ok(aligned_image)
}

fn resize_with_image_crate_fallback(
    src_pixels: &[u8],
    src_width: u32,
    src_height: u32,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let filter = FilterType::Lanczos3;
    match pixel_type {
        PixelType::U8x3 => {
            let rgb = RgbImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgb8(image::imageops::resize(
                &rgb, dst_width, dst_height, filter,
            )))
        }
        PixelType::U8x4 => {
            let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgba8(image::imageops::resize(
                &rgba, dst_width, dst_height, filter,
            )))
        }
        _ => Err("fallback resize supports only U8x3/U8x4 pixel types".to_string()),
    }
}

/// Check if an RGBA image is fully opaque (all alpha values are 255).
///
/// Only checks images of at least 1MP; for smaller ones the premultiply is
/// cheaper than the scan.
fn is_fully_opaque(image: &fir::images::Image, pixel_type: PixelType) -> bool {
    if pixel_type != PixelType::U8x4 {
        return true;
    }

    const THRESHOLD_PIXELS: u64 = 1_000_000;
    if (image.width() as u64).saturating_mul(image.height() as u64) < THRESHOLD_PIXELS {
        return false;
    }

    image.buffer().iter().skip(3).step_by(4).all(|&alpha| alpha == 255)
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    let needs_premultiply =
        requires_premultiply(pixel_type) && !is_fully_opaque(&src_image, pixel_type);

    let mul_div = MulDiv::default();
    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => {
            let rgb_image = RgbImage::from_raw(dst_width, dst_height, dst_pixels)
                .ok_or("failed to create rgb image from resized data")?;
            Ok(DynamicImage::ImageRgb8(rgb_image))
        }
        PixelType::U8x4 => {
            let rgba_image = RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
                .ok_or("failed to create rgba image from resized data")?;
            Ok(DynamicImage::ImageRgba8(rgba_image))
        }
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

/// Sharpen color channels: `out = in + (in - blur(in)) * amount / 100` where
/// `|in - blur(in)| >= threshold`. Alpha is left untouched.
pub fn apply_unsharp_mask(img: DynamicImage, mask: &UnsharpMask) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(mut rgb) => {
            sharpen_buffer(&mut rgb, mask);
            DynamicImage::ImageRgb8(rgb)
        }
        DynamicImage::ImageRgba8(mut rgba) => {
            sharpen_buffer(&mut rgba, mask);
            DynamicImage::ImageRgba8(rgba)
        }
        other => other,
    }
}

fn sharpen_buffer<P>(buffer: &mut ImageBuffer<P, Vec<u8>>, mask: &UnsharpMask)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let blurred = image::imageops::blur(&*buffer, mask.radius);
    let channels = P::CHANNEL_COUNT as usize;
    let color_channels = channels.min(3);
    let amount = mask.amount as f32 / 100.0;
    let threshold = mask.threshold as i16;

    for (dst, blur) in buffer
        .chunks_exact_mut(channels)
        .zip(blurred.as_raw().chunks_exact(channels))
    {
        for c in 0..color_channels {
            let diff = dst[c] as i16 - blur[c] as i16;
            if diff.abs() < threshold {
                continue;
            }
            let value = dst[c] as f32 + diff as f32 * amount;
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}
