//! Codec gateway: turn any accepted input into a [`RasterSource`].
//!
//! Most formats (JPEG, PNG, GIF, WebP, BMP, TIFF) take the **native** path:
//! the bytes are kept as-is and decoded by the `image` crate only when the
//! normalizer rasterises them, so a corrupt file fails at render time with
//! its name attached.
//!
//! HEIC/HEIF files take the **specialized** path through a
//! [`SpecializedDecoder`]. Its answer is an explicit [`HeifDecode`]: either
//! pixels, or `NeedsFallback` with the reason. On `NeedsFallback` the
//! gateway retries the original bytes on the native path, because some
//! files labelled `.heic` are really JPEGs and some builds ship without
//! libheif. If the native path then fails too, the item fails.

use crate::error::DecodeError;
use crate::pipeline::input::RawImageInput;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

/// MIME types routed to the specialized decoder.
pub const HEIF_MIME_TYPES: [&str; 2] = ["image/heic", "image/heif"];

/// File-name suffixes routed to the specialized decoder (matched case-insensitively).
pub const HEIF_EXTENSIONS: [&str; 2] = [".heic", ".heif"];

/// A decoded or decodable image, ready for the normalizer.
#[derive(Debug, Clone)]
pub enum RasterSource {
    /// Pixels already produced by the specialized decoder.
    Pixels(DynamicImage),
    /// Bytes in a natively supported format; decoded by [`RasterSource::rasterize`].
    Encoded(Arc<[u8]>),
}

impl RasterSource {
    /// Produce pixels, applying the EXIF orientation of natively decoded files.
    pub fn rasterize(self) -> Result<DynamicImage, image::ImageError> {
        match self {
            RasterSource::Pixels(img) => Ok(img),
            RasterSource::Encoded(bytes) => decode_native(&bytes),
        }
    }
}

/// Outcome of the specialized decoder.
#[derive(Debug)]
pub enum HeifDecode {
    Decoded(RasterSource),
    NeedsFallback(DecodeError),
}

/// Decoder for the high-efficiency container formats.
pub trait SpecializedDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> HeifDecode;
}

/// Decoder used when the crate is built without the `heif` feature.
///
/// Always asks for the native fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDecoder;

impl SpecializedDecoder for UnavailableDecoder {
    fn decode(&self, _bytes: &[u8]) -> HeifDecode {
        HeifDecode::NeedsFallback(DecodeError::Unavailable)
    }
}

#[cfg(feature = "heif")]
pub use libheif::LibheifDecoder;

#[cfg(feature = "heif")]
mod libheif {
    use super::{HeifDecode, RasterSource, SpecializedDecoder};
    use crate::error::DecodeError;
    use image::{DynamicImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    /// HEIC/HEIF decoder backed by the system libheif.
    ///
    /// Decodes the primary image with its container transformations
    /// (rotation, mirroring) applied.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibheifDecoder;

    impl SpecializedDecoder for LibheifDecoder {
        fn decode(&self, bytes: &[u8]) -> HeifDecode {
            match decode_primary(bytes) {
                Ok(img) => HeifDecode::Decoded(RasterSource::Pixels(img)),
                Err(e) => HeifDecode::NeedsFallback(e),
            }
        }
    }

    fn decode_primary(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes)
            .map_err(|e| DecodeError::Backend(e.to_string()))?;
        if ctx.number_of_top_level_images() == 0 {
            return Err(DecodeError::NoFrames);
        }
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| DecodeError::Backend(e.to_string()))?;
        let image = lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), None)
            .map_err(|e| DecodeError::Backend(e.to_string()))?;

        let planes = image.planes();
        let plane = planes.interleaved.ok_or(DecodeError::RenderFailure)?;
        let (width, height) = (plane.width, plane.height);
        let row_len = width as usize * 4;
        if width == 0 || height == 0 || plane.stride < row_len {
            return Err(DecodeError::RenderFailure);
        }

        // libheif pads rows to `stride`; repack them tightly.
        let mut rgba = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            let row = row.get(..row_len).ok_or(DecodeError::RenderFailure)?;
            rgba.extend_from_slice(row);
        }

        RgbaImage::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8)
            .ok_or(DecodeError::RenderFailure)
    }
}

/// The specialized decoder compiled into this build.
pub fn default_decoder() -> Arc<dyn SpecializedDecoder> {
    #[cfg(feature = "heif")]
    {
        Arc::new(LibheifDecoder)
    }
    #[cfg(not(feature = "heif"))]
    {
        Arc::new(UnavailableDecoder)
    }
}

/// Which decode path a file takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecRoute {
    Specialized,
    Native,
}

/// Route by declared MIME type, then by case-insensitive name suffix.
pub fn classify(file: &RawImageInput) -> CodecRoute {
    let mime = file.mime.trim().to_ascii_lowercase();
    let name = file.name.to_ascii_lowercase();
    if HEIF_MIME_TYPES.contains(&mime.as_str())
        || HEIF_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    {
        CodecRoute::Specialized
    } else {
        CodecRoute::Native
    }
}

/// What the gateway produced for one file.
#[derive(Debug)]
pub struct Resolved {
    pub source: RasterSource,
    /// Set when the specialized decoder gave up and the native path was used.
    pub fallback: Option<DecodeError>,
}

/// Resolve a raw input into a raster source.
///
/// Never fails: specialized-decoder errors turn into a native fallback, and
/// native decoding errors surface later from [`RasterSource::rasterize`].
pub fn resolve(file: RawImageInput, decoder: &dyn SpecializedDecoder) -> Resolved {
    match classify(&file) {
        CodecRoute::Native => Resolved {
            source: RasterSource::Encoded(file.bytes),
            fallback: None,
        },
        CodecRoute::Specialized => match decoder.decode(&file.bytes) {
            HeifDecode::Decoded(source) => {
                debug!("Decoded {} with the HEIF decoder", file.name);
                Resolved {
                    source,
                    fallback: None,
                }
            }
            HeifDecode::NeedsFallback(reason) => {
                warn!(
                    "{}: {}; retrying as a natively supported image",
                    file.name, reason
                );
                Resolved {
                    source: RasterSource::Encoded(file.bytes),
                    fallback: Some(reason),
                }
            }
        },
    }
}

fn decode_native(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}
