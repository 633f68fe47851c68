//! Output formats and encoders.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageFormat, ImageReader};
use webprep_common::error::{WebprepError, WebprepResult};

/// Lossy quality used when a WebP source is written back as WebP.
pub const REENCODE_WEBP_QUALITY: u8 = 80;

/// Formats the optimizer can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
    Avif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::WebP, Self::Jpeg, Self::Png, Self::Avif];

    /// Pick the encoder from an output path's extension.
    ///
    /// Anything that is not `.webp`, `.png` or `.avif` is written as JPEG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "webp" => Self::WebP,
            "png" => Self::Png,
            "avif" => Self::Avif,
            _ => Self::Jpeg,
        }
    }

    /// Parse a user-facing format name.
    pub fn from_name(name: &str) -> WebprepResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::WebP),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "avif" => Ok(Self::Avif),
            other => Err(WebprepError::unsupported(format!(
                "Unknown image format: {other}. Use: webp, jpg, png, avif"
            ))),
        }
    }

    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Avif => "avif",
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Lossy quality (0-100). PNG ignores it.
    pub quality: u8,
    /// libwebp effort, 0 (fast) to 6 (smallest).
    pub webp_method: u8,
    /// AVIF speed, 1 (slowest) to 10.
    pub avif_speed: u8,
}

impl EncodeOptions {
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            webp_method: 6,
            avif_speed: 2,
        }
    }
}

/// Decode an image, sniffing the container from its content rather than
/// its extension. Returns the detected format alongside the pixels.
pub fn open_image(path: &Path) -> WebprepResult<(DynamicImage, ImageFormat)> {
    if !path.exists() {
        return Err(WebprepError::file_not_found(path));
    }
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        WebprepError::image(format!("Unrecognized image format: {}", path.display()))
    })?;
    let img = reader
        .decode()
        .map_err(|e| WebprepError::image(format!("Failed to decode {}: {e}", path.display())))?;
    Ok((img, format))
}

/// Encode `img` into an in-memory buffer.
pub fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    options: &EncodeOptions,
) -> WebprepResult<Vec<u8>> {
    match format {
        OutputFormat::WebP => encode_webp(img, options),
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel; palette and alpha are flattened away.
            let rgb = img.to_rgb8();
            let mut buf = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| WebprepError::image(format!("JPEG encoding failed: {e}")))?;
            Ok(buf)
        }
        OutputFormat::Png => {
            let prepared: Cow<'_, DynamicImage> = match img {
                DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                    Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16()))
                }
                _ => Cow::Borrowed(img),
            };
            let mut buf = Vec::new();
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            prepared
                .write_with_encoder(encoder)
                .map_err(|e| WebprepError::image(format!("PNG encoding failed: {e}")))?;
            Ok(buf)
        }
        OutputFormat::Avif => {
            let prepared = to_8bit(img);
            let mut buf = Vec::new();
            let encoder = AvifEncoder::new_with_speed_quality(
                &mut buf,
                options.avif_speed.clamp(1, 10),
                options.quality.min(100),
            );
            prepared
                .write_with_encoder(encoder)
                .map_err(|e| WebprepError::image(format!("AVIF encoding failed: {e}")))?;
            Ok(buf)
        }
    }
}

/// Encode a tiny image to confirm an encoder works in this build.
/// Returns the encoded size.
pub fn probe_encoder(format: OutputFormat) -> WebprepResult<usize> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([200, 80, 40])));
    let options = EncodeOptions {
        avif_speed: 10,
        ..EncodeOptions::default()
    };
    Ok(encode(&img, format, &options)?.len())
}

/// Encode in the container an image was originally read from.
///
/// WebP goes through libwebp at [`REENCODE_WEBP_QUALITY`]; `image` alone
/// would write it lossless.
pub fn encode_as(img: &DynamicImage, format: ImageFormat) -> WebprepResult<Vec<u8>> {
    let prepared: Cow<'_, DynamicImage> = match format {
        ImageFormat::WebP => {
            return encode(
                img,
                OutputFormat::WebP,
                &EncodeOptions::with_quality(REENCODE_WEBP_QUALITY),
            )
        }
        ImageFormat::Jpeg => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        ImageFormat::Gif => to_8bit(img),
        _ => Cow::Borrowed(img),
    };
    let mut cursor = Cursor::new(Vec::new());
    prepared
        .write_to(&mut cursor, format)
        .map_err(|e| WebprepError::image(format!("{format:?} encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// libwebp only accepts 8-bit RGB or RGBA input.
fn encode_webp(img: &DynamicImage, options: &EncodeOptions) -> WebprepResult<Vec<u8>> {
    let prepared = to_8bit(img);
    let encoder = webp::Encoder::from_image(&prepared)
        .map_err(|e| WebprepError::image(format!("WebP encoder rejected image: {e}")))?;

    let mut config = webp::WebPConfig::new()
        .map_err(|_| WebprepError::image("Failed to initialize WebP config"))?;
    config.quality = f32::from(options.quality.min(100));
    config.method = i32::from(options.webp_method.min(6));

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| WebprepError::image(format!("WebP encoding failed: {e:?}")))?;
    Ok(memory.to_vec())
}

/// Convert to RGB8 or RGBA8, keeping alpha when the source has it.
fn to_8bit(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(img),
        _ if img.color().has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
    }
}
