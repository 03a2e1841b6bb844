//! # images2docx
//!
//! Turn a batch of photos into a Word document with the images laid out in
//! a uniform grid.
//!
//! ## Why this crate?
//!
//! Printing a stack of phone photos as same-size tiles (ID photos, inventory
//! shots, contact sheets) usually means dragging each image into a word
//! processor and resizing it by hand. This crate does it in one call: every
//! image is decoded (including HEIC from iPhones), orientation-corrected,
//! downscaled, recompressed as JPEG, and placed into a full-width table with
//! a fixed display size per cell.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Codec      HEIC/HEIF → libheif, everything else → image crate
//!  ├─ 2. Normalize  cap longer side at 800 px, JPEG q=0.7, stamp footprint
//!  ├─ 3. Layout     rows of 3, last row padded with empty cells
//!  └─ 4. Assemble   one table in one section → images.docx
//! ```
//!
//! Steps 1–2 run one file at a time on tokio's blocking pool; a file no
//! decoder can read aborts the batch with an error naming it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use images2docx::{convert_paths, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_paths(&["a.jpg", "b.heic", "c.png"], &config).await?;
//!     std::fs::write(&output.document.file_name, &output.document.bytes)?;
//!     eprintln!("{} images in {} rows", output.stats.images, output.stats.rows);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `heif`  | off     | Decode HEIC/HEIF with the system libheif |
//!
//! Without `heif`, HEIC files are still attempted on the native path, which
//! works when the file is actually a JPEG or PNG with the wrong extension.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, EmptyBatchPolicy, Footprint};
pub use convert::{
    convert, convert_paths, convert_sync, convert_to_file, convert_with_decoder,
};
pub use error::{DecodeError, Images2DocxError};
pub use output::{ConversionOutput, ConversionStats, DocumentArtifact};
pub use pipeline::codec::{HeifDecode, RasterSource, SpecializedDecoder};
pub use pipeline::input::RawImageInput;
pub use pipeline::layout::{GridCell, GridRow};
pub use pipeline::normalize::{ImageEncoding, NormalizedImage};
pub use progress::{
    BatchProgressCallback, NoopProgressCallback, ProgressCallback, ProgressState, ProgressTracker,
};
pub use stream::normalize_stream;
