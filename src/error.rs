//! Error types for the images2docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Images2DocxError`] — **Fatal**: the batch cannot produce a document
//!   (an input could not be rasterised by any decode path, the container
//!   failed to serialise, the configuration is invalid). Returned as
//!   `Err(Images2DocxError)` from the top-level `convert*` functions.
//!
//! * [`DecodeError`] — **Recovered**: the specialized HEIC/HEIF decoder could
//!   not produce pixels. The codec gateway falls back to the native decode
//!   path and only logs the error; it surfaces to callers solely through
//!   [`crate::output::ConversionStats::fallbacks`].
//!
//! There is no partial-document mode: a single unrenderable file aborts the
//! batch, and the error names that file so the user knows what to remove.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the images2docx library.
#[derive(Debug, Error)]
pub enum Images2DocxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// No decode path could rasterise the file. Fatal to the batch.
    #[error("Could not load image '{file}': {detail}")]
    RenderFailed { file: String, detail: String },

    /// The document container failed to serialise.
    #[error("Failed to assemble document: {detail}")]
    AssemblyFailed { detail: String },

    /// The batch was empty and the configured policy rejects empty batches.
    #[error("No images were selected")]
    EmptyBatch,

    /// The cancellation flag was raised between two files.
    #[error("Conversion cancelled after {processed}/{total} images")]
    Cancelled { processed: usize, total: usize },

    /// Another conversion is still reporting to the same progress tracker.
    #[error("A conversion is already running on this progress tracker\nGive each concurrent conversion its own ProgressTracker.")]
    TrackerBusy,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Images2DocxError {
    /// Name of the input file responsible for the failure, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Images2DocxError::RenderFailed { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// Why the specialized (HEIC/HEIF) decoder gave up on a file.
///
/// Never returned from `convert*`: the codec gateway answers every variant by
/// retrying the bytes on the native decode path.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DecodeError {
    /// The container decoded but held no image frames.
    #[error("HEIF container holds no frames")]
    NoFrames,

    /// Decoding ran but produced no pixel data.
    #[error("HEIF decoder produced no pixel data")]
    RenderFailure,

    /// No specialized decoder is compiled into this build.
    #[error("HEIF decoding is not available in this build (enable the `heif` feature)")]
    Unavailable,

    /// The decoding library reported an error.
    #[error("HEIF decoder error: {0}")]
    Backend(String),
}
