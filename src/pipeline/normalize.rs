//! Normalizer: bounded resize + lossy recompression.
//!
//! Photos straight off a phone are 12+ megapixels; embedding them as-is
//! would make a 30-image document hundreds of megabytes even though each
//! is displayed at a few centimetres. The normalizer caps the longer side
//! at `max_dimension` and re-encodes as JPEG. The displayed size is stamped
//! separately from the caller's footprint, so the resize never changes the
//! layout.

use crate::config::{ConversionConfig, Footprint};
use crate::error::Images2DocxError;
use crate::pipeline::codec::RasterSource;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Encoding of every normalized image. The pipeline emits exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageEncoding {
    Jpeg,
}

impl ImageEncoding {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpeg",
        }
    }
}

/// A recompressed image tagged with its display footprint.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub encoding: ImageEncoding,
    pub display_width: u32,
    pub display_height: u32,
}

impl fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("encoding", &self.encoding)
            .field("display_width", &self.display_width)
            .field("display_height", &self.display_height)
            .finish()
    }
}

/// Pixel size to recompress at: unchanged when both sides fit within
/// `max_dim`, otherwise the longer side becomes `max_dim` and the shorter
/// side is scaled and rounded. A `max_dim` of 0 is treated as 1.
pub fn resize_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let max_dim = max_dim.max(1);
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }
    let scale = |shorter: u32, longer: u32| -> u32 {
        let scaled = (f64::from(shorter) * f64::from(max_dim) / f64::from(longer)).round();
        (scaled as u32).max(1)
    };
    if width > height {
        (max_dim, scale(height, width))
    } else {
        (scale(width, height), max_dim)
    }
}

/// Rasterise, resize and JPEG-encode one image.
///
/// `file_name` is only used to label the error when the source cannot be
/// rasterised.
pub fn normalize(
    source: RasterSource,
    footprint: Footprint,
    config: &ConversionConfig,
    file_name: &str,
) -> Result<NormalizedImage, Images2DocxError> {
    let img = source
        .rasterize()
        .map_err(|e| Images2DocxError::RenderFailed {
            file: file_name.to_string(),
            detail: e.to_string(),
        })?;

    let (src_w, src_h) = (img.width(), img.height());
    if src_w == 0 || src_h == 0 {
        return Err(Images2DocxError::RenderFailed {
            file: file_name.to_string(),
            detail: "image has no pixels".into(),
        });
    }

    let (w, h) = resize_dimensions(src_w, src_h, config.max_dimension);
    let resized = if (w, h) == (src_w, src_h) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };
    debug!("{}: {}x{} → {}x{} px", file_name, src_w, src_h, w, h);

    let bytes = encode_jpeg(&resized, config.jpeg_quality()).map_err(|e| {
        Images2DocxError::RenderFailed {
            file: file_name.to_string(),
            detail: format!("JPEG encoding failed: {e}"),
        }
    })?;

    Ok(NormalizedImage {
        bytes,
        encoding: ImageEncoding::Jpeg,
        display_width: footprint.width,
        display_height: footprint.height,
    })
}

/// JPEG has no alpha channel, so everything is flattened to RGB8 first.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(buf)
}
