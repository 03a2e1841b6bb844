//! Pipeline stages for image-grid document generation.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ codec ──▶ normalize ──▶ layout ──▶ assemble
//! (blobs)   (HEIF?)   (resize+JPEG)  (rows)     (.docx)
//! ```
//!
//! 1. [`input`]     — raw file blobs with name and MIME type
//! 2. [`codec`]     — route HEIC/HEIF through the specialized decoder, fall
//!    back to native decoding when it gives up
//! 3. [`normalize`] — cap the longer side, re-encode as JPEG, stamp the
//!    display footprint
//! 4. [`layout`]    — chunk into fixed-width rows, pad the last one
//! 5. [`assemble`]  — write the table into a `.docx` package
//!
//! Stages 2–3 run per file; [`process_item`] chains them for one input.

pub mod assemble;
pub mod codec;
pub mod input;
pub mod layout;
pub mod normalize;

use crate::config::ConversionConfig;
use crate::error::{DecodeError, Images2DocxError};
use codec::SpecializedDecoder;
use input::RawImageInput;
use normalize::NormalizedImage;
use std::sync::Arc;

/// One input after codec routing and normalization.
#[derive(Debug)]
pub struct ProcessedItem {
    pub image: NormalizedImage,
    pub fallback: Option<DecodeError>,
}

/// Run codec gateway then normalizer for a single file on the blocking pool.
///
/// Decoding and JPEG encoding are CPU-bound; running them inline would
/// stall the async executor for the duration of each image.
pub async fn process_item(
    file: RawImageInput,
    decoder: Arc<dyn SpecializedDecoder>,
    config: &ConversionConfig,
) -> Result<ProcessedItem, Images2DocxError> {
    let footprint = config.footprint;
    let cfg = config.clone();
    let name = file.name.clone();

    tokio::task::spawn_blocking(move || {
        let resolved = codec::resolve(file, decoder.as_ref());
        let image = normalize::normalize(resolved.source, footprint, &cfg, &name)?;
        Ok(ProcessedItem {
            image,
            fallback: resolved.fallback,
        })
    })
    .await
    .map_err(|e| Images2DocxError::Internal(format!("Image task panicked: {}", e)))?
}
