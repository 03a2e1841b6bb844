//! Streaming API: normalized images one at a time, in input order.
//!
//! [`crate::convert::convert`] buffers every normalized image and returns
//! a finished document. [`normalize_stream`] instead yields each
//! [`NormalizedImage`] as soon as it is ready, for callers that want to show
//! thumbnails as they arrive or build their own container. Items are
//! processed sequentially (`then`, not `buffer_unordered`), so the stream
//! keeps input order and holds at most one decoded raster at a time.
//!
//! The stream does not stop on its own after an error; stop polling when
//! you see one if you need batch atomicity.

use crate::config::ConversionConfig;
use crate::error::Images2DocxError;
use crate::pipeline::codec::{self, SpecializedDecoder};
use crate::pipeline::input::RawImageInput;
use crate::pipeline::normalize::NormalizedImage;
use crate::pipeline::process_item;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of normalized images.
pub type ImageStream =
    Pin<Box<dyn Stream<Item = Result<NormalizedImage, Images2DocxError>> + Send>>;

/// Normalize `files` lazily, yielding results in input order.
pub fn normalize_stream(files: Vec<RawImageInput>, config: &ConversionConfig) -> ImageStream {
    normalize_stream_with_decoder(files, config, codec::default_decoder())
}

/// [`normalize_stream`] with an explicit HEIC/HEIF decoder.
pub fn normalize_stream_with_decoder(
    files: Vec<RawImageInput>,
    config: &ConversionConfig,
    decoder: Arc<dyn SpecializedDecoder>,
) -> ImageStream {
    info!("Starting streaming normalization of {} images", files.len());
    let config = config.clone();

    let s = stream::iter(files).then(move |file| {
        let decoder = Arc::clone(&decoder);
        let cfg = config.clone();
        async move {
            process_item(file, decoder, &cfg)
                .await
                .map(|item| item.image)
        }
    });

    Box::pin(s)
}
