// src/engine/codec.rs
//
// Codec adapter: a uniform async interface over the synchronous decoders and
// encoders. CPU-bound work runs on tokio's blocking pool so the scheduler is
// free to interleave other files while one is being decoded or encoded.

use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use tracing::debug;

use crate::display::DataUrl;
use crate::engine::common::{run_blocking, EngineResult};
use crate::engine::decoder::{decode_image, detect_format};
use crate::engine::encoder;
use crate::engine::io::{HandleTracker, SourceFile};
use crate::engine::planner::Dimensions;
use crate::error::{PipelineStage, ThumbnailError};
use crate::settings::OutputFormat;

/// Decoded pixels. Cloning shares the buffer.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    image: Arc<DynamicImage>,
}

impl PixelSurface {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub(crate) fn shared(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.image)
    }
}

impl From<DynamicImage> for PixelSurface {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// Compressed output of an encode call.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub dimensions: Dimensions,
}

impl EncodedImage {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn to_data_url(&self) -> DataUrl {
        DataUrl::encode(self.mime_type(), &self.bytes)
    }
}

/// Decode and encode primitives the pipeline is written against.
#[async_trait]
pub trait Codec: Send + Sync {
    /// Bytes to pixels. Fails with a decode-stage error on unreadable or
    /// unsupported input.
    async fn decode(&self, file: &SourceFile) -> EngineResult<PixelSurface>;

    /// Pixels to compressed bytes. Fails with an encode-stage error when the
    /// encoder produces nothing.
    async fn encode(&self, surface: &PixelSurface, format: OutputFormat) -> EngineResult<EncodedImage>;

    /// The source file as-is, in a form the display layer can show.
    async fn to_display(&self, file: &SourceFile) -> EngineResult<DataUrl>;
}

/// Default codec: mozjpeg/zune-png/image crate on the blocking pool.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    handles: Arc<HandleTracker>,
}

impl ImageCodec {
    pub fn new() -> Self {
        Self::with_tracker(HandleTracker::new())
    }

    pub fn with_tracker(handles: Arc<HandleTracker>) -> Self {
        Self { handles }
    }

    pub fn handles(&self) -> &Arc<HandleTracker> {
        &self.handles
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Codec for ImageCodec {
    async fn decode(&self, file: &SourceFile) -> EngineResult<PixelSurface> {
        let handle = self.handles.acquire(file);
        let name = file.name().to_string();

        // The handle moves into the worker and is dropped there, whatever the
        // decode outcome.
        let (image, format) = run_blocking(PipelineStage::Decode, "decode", move || {
            let decoded = decode_image(handle.bytes());
            drop(handle);
            decoded
        })
        .await?;

        debug!(
            name = %name,
            format = ?format,
            width = image.width(),
            height = image.height(),
            "decoded source"
        );
        Ok(PixelSurface::new(image))
    }

    async fn encode(&self, surface: &PixelSurface, format: OutputFormat) -> EngineResult<EncodedImage> {
        let image = surface.shared();
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(ThumbnailError::encode_failed(
                format.name(),
                format!("cannot encode a {width}x{height} surface"),
            ));
        }

        let bytes = run_blocking(PipelineStage::Encode, "encode", move || {
            encoder::encode(&image, format)
        })
        .await?;

        if bytes.is_empty() {
            return Err(ThumbnailError::encode_failed(
                format.name(),
                "encoder produced no output",
            ));
        }

        Ok(EncodedImage {
            bytes,
            format,
            dimensions: Dimensions::new(width, height),
        })
    }

    async fn to_display(&self, file: &SourceFile) -> EngineResult<DataUrl> {
        let handle = self.handles.acquire(file);
        if handle.bytes().is_empty() {
            return Err(ThumbnailError::encode_failed(
                "data-url",
                format!("{} has no content to display", file.name()),
            ));
        }

        let mime = display_mime(file);
        run_blocking(PipelineStage::Encode, "display", move || {
            let url = DataUrl::encode(&mime, handle.bytes());
            drop(handle);
            Ok(url)
        })
        .await
    }
}

/// MIME for the original's display form: what the selection control reported,
/// else the sniffed format, else opaque bytes.
fn display_mime(file: &SourceFile) -> String {
    let reported = file.mime_type().trim();
    if !reported.is_empty() {
        return reported.to_string();
    }
    detect_format(file.bytes())
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_file(name: &str, width: u32, height: u32, mime: &str) -> SourceFile {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        SourceFile::new(name, mime, buffer)
    }

    #[tokio::test]
    async fn decode_releases_handle_on_success() {
        let codec = ImageCodec::new();
        let surface = codec
            .decode(&png_file("red.png", 12, 7, "image/png"))
            .await
            .unwrap();
        assert_eq!(surface.dimensions(), (12, 7));
        assert_eq!(codec.handles().live(), 0);
        assert_eq!(codec.handles().acquired(), 1);
    }

    #[tokio::test]
    async fn decode_releases_handle_on_failure() {
        let codec = ImageCodec::new();
        let junk = SourceFile::new("junk.jpg", "image/jpeg", b"not really a jpeg".to_vec());
        let err = codec.decode(&junk).await.unwrap_err();
        assert!(err.is_decode_error());
        assert_eq!(codec.handles().live(), 0);
        assert_eq!(codec.handles().acquired(), 1);
    }

    #[tokio::test]
    async fn encode_reports_size_and_dimensions() {
        let codec = ImageCodec::new();
        let surface = PixelSurface::new(DynamicImage::ImageRgb8(RgbImage::new(20, 10)));
        let encoded = codec
            .encode(&surface, OutputFormat::Jpeg { quality: 90 })
            .await
            .unwrap();
        assert_eq!(encoded.dimensions, Dimensions::new(20, 10));
        assert_eq!(encoded.byte_size(), encoded.bytes.len() as u64);
        assert_eq!(encoded.mime_type(), "image/jpeg");
        assert!(encoded.to_data_url().as_str().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn encode_zero_surface_fails() {
        let codec = ImageCodec::new();
        let surface = PixelSurface::new(DynamicImage::ImageRgb8(RgbImage::new(0, 5)));
        let err = codec
            .encode(&surface, OutputFormat::default())
            .await
            .unwrap_err();
        assert!(err.is_encode_error());
    }

    #[tokio::test]
    async fn display_uses_reported_mime_then_sniffs() {
        let codec = ImageCodec::new();

        let reported = codec
            .to_display(&png_file("a.png", 2, 2, "image/png"))
            .await
            .unwrap();
        assert_eq!(reported.mime_type(), "image/png");

        let sniffed = codec.to_display(&png_file("b", 2, 2, "")).await.unwrap();
        assert_eq!(sniffed.mime_type(), "image/png");

        let opaque = codec
            .to_display(&SourceFile::new("c", "", vec![1u8, 2, 3]))
            .await
            .unwrap();
        assert_eq!(opaque.mime_type(), "application/octet-stream");
        assert_eq!(opaque.decode().unwrap(), vec![1, 2, 3]);
        assert_eq!(codec.handles().live(), 0);
    }

    #[tokio::test]
    async fn display_of_empty_file_is_encode_error() {
        let codec = ImageCodec::new();
        let err = codec
            .to_display(&SourceFile::new("empty.png", "image/png", Vec::new()))
            .await
            .unwrap_err();
        assert!(err.is_encode_error());
        assert_eq!(codec.handles().live(), 0);
    }
}
