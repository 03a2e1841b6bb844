//! Pipeline orchestrator: the conversion entry points.
//!
//! Files go through codec gateway → normalizer strictly one at a time, so
//! progress advances in input order and at most one decoded raster is alive
//! at once. Once every file is normalized the grid is laid out and the
//! document assembled.
//!
//! The batch is atomic: if any file cannot be loaded, the whole run fails
//! with an error naming that file and no document is produced. Progress is
//! reset to `(0, 0)` whether the run succeeds, fails, is cancelled, or its
//! future is dropped. A config's tracker serves one run at a time.

use crate::config::{ConversionConfig, EmptyBatchPolicy};
use crate::error::Images2DocxError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::codec::{self, SpecializedDecoder};
use crate::pipeline::input::{self, RawImageInput};
use crate::pipeline::{assemble, layout, process_item};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a batch of raw image files into a `.docx` grid.
///
/// This is the primary entry point for the library. HEIC/HEIF files use the
/// decoder compiled into this build (see [`codec::default_decoder`]).
///
/// # Errors
/// - [`Images2DocxError::RenderFailed`] naming the first file no decode path
///   could rasterise
/// - [`Images2DocxError::EmptyBatch`] for an empty list under
///   [`EmptyBatchPolicy::Reject`]
/// - [`Images2DocxError::Cancelled`] when the cancel flag was raised
/// - [`Images2DocxError::AssemblyFailed`] if the container cannot be written
/// - [`Images2DocxError::TrackerBusy`] if another run holds `config.progress`
pub async fn convert(
    files: Vec<RawImageInput>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Images2DocxError> {
    convert_with_decoder(files, config, codec::default_decoder()).await
}

/// [`convert`] with an explicit HEIC/HEIF decoder.
pub async fn convert_with_decoder(
    files: Vec<RawImageInput>,
    config: &ConversionConfig,
    decoder: Arc<dyn SpecializedDecoder>,
) -> Result<ConversionOutput, Images2DocxError> {
    run_batch(files, config, decoder).await
}

async fn run_batch(
    files: Vec<RawImageInput>,
    config: &ConversionConfig,
    decoder: Arc<dyn SpecializedDecoder>,
) -> Result<ConversionOutput, Images2DocxError> {
    let total_start = Instant::now();
    let total = files.len();
    info!("Starting conversion of {} images", total);

    if total == 0 && config.empty_batch == EmptyBatchPolicy::Reject {
        return Err(Images2DocxError::EmptyBatch);
    }

    // Held until this future completes or is dropped; either way the
    // tracker goes back to idle.
    let progress = config.progress.begin(total)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 1: Decode + normalize, one file at a time ───────────────────
    let normalize_start = Instant::now();
    let mut images = Vec::with_capacity(total);
    let mut stats = ConversionStats {
        columns: config.columns,
        ..Default::default()
    };

    for (i, file) in files.into_iter().enumerate() {
        let index = i + 1;
        if is_cancelled(config) {
            info!("Cancelled before image {}/{}", index, total);
            return Err(Images2DocxError::Cancelled {
                processed: i,
                total,
            });
        }

        let name = file.name.clone();
        stats.input_bytes += file.bytes.len() as u64;
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(index, total, &name);
        }

        match process_item(file, Arc::clone(&decoder), config).await {
            Ok(item) => {
                if item.fallback.is_some() {
                    stats.fallbacks += 1;
                }
                let len = item.image.bytes.len();
                stats.encoded_bytes += len as u64;
                debug!("Image {}/{} '{}' → {} bytes", index, total, name, len);
                images.push(item.image);
                progress.advance();
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_complete(index, total, len);
                }
            }
            Err(e) => {
                warn!("Image {}/{} '{}' failed: {}", index, total, name, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(index, total, &name, &e.to_string());
                }
                return Err(e);
            }
        }
    }
    stats.normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;

    // ── Step 2: Layout ───────────────────────────────────────────────────
    stats.images = images.len();
    let rows = layout::layout(images, config.columns);
    stats.rows = rows.len();

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let assemble_start = Instant::now();
    let file_name = config.output_file_name.clone();
    let document = tokio::task::spawn_blocking(move || assemble::assemble(&rows, &file_name))
        .await
        .map_err(|e| Images2DocxError::Internal(format!("Assembly task panicked: {}", e)))??;
    stats.assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;
    stats.document_bytes = document.len() as u64;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} images in {} rows, {} bytes, {}ms total",
        stats.images, stats.rows, stats.document_bytes, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total);
    }

    Ok(ConversionOutput { document, stats })
}

fn is_cancelled(config: &ConversionConfig) -> bool {
    config
        .cancel_flag
        .as_ref()
        .is_some_and(|f| f.load(Ordering::SeqCst))
}

/// Read image files from disk and convert them.
///
/// MIME types are inferred from the file extensions.
pub async fn convert_paths<P: AsRef<Path>>(
    paths: &[P],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Images2DocxError> {
    let files = input::load_paths(paths).await?;
    convert(files, config).await
}

/// Convert image files and write the document to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// failed run never leaves a truncated document behind.
pub async fn convert_to_file<P: AsRef<Path>>(
    paths: &[P],
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Images2DocxError> {
    let output = convert_paths(paths, config).await?;
    let path = output_path.as_ref().to_path_buf();

    let write_err = |source: std::io::Error| Images2DocxError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await.map_err(write_err)?;

    let target = path.clone();
    let bytes = output.document.bytes;
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| Images2DocxError::Internal(format!("Write task panicked: {}", e)))?
    .map_err(write_err)?;

    info!("Wrote {}", path.display());
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    files: Vec<RawImageInput>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Images2DocxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Images2DocxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(files, config))
}
