//! Configuration types for image-grid document generation.
//!
//! Every knob the pipeline uses lives in [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. The defaults reproduce the classic layout:
//! three 4.5 cm × 6 cm photos per row, each recompressed to at most 800 px
//! on its longer side at JPEG quality 0.7.

use crate::error::Images2DocxError;
use crate::progress::{ProgressCallback, ProgressTracker};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const DEFAULT_QUALITY: f32 = 0.7;

/// Display size stamped onto every image in the document, in pixels.
///
/// Independent of the source resolution: a 4000 × 3000 photo and a 64 × 64
/// icon both occupy exactly this box in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Footprint {
    /// 4.5 cm × 6 cm at 72 dpi (cm ÷ 2.54 × 72).
    fn default() -> Self {
        Self::new(128, 170)
    }
}

/// What to do when the caller supplies no images at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyBatchPolicy {
    /// Produce a valid document with an empty body (no table). (default)
    #[default]
    EmptyDocument,
    /// Fail with [`Images2DocxError::EmptyBatch`].
    Reject,
}

/// Configuration for one image-batch conversion.
///
/// # Example
/// ```rust
/// use images2docx::{ConversionConfig, Footprint};
///
/// let config = ConversionConfig::builder()
///     .footprint(Footprint::new(200, 150))
///     .columns(4)
///     .quality(0.8)
///     .build()
///     .unwrap();
/// assert_eq!(config.columns, 4);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Display size of every image cell. Default: 128 × 170.
    pub footprint: Footprint,

    /// Longest side, in pixels, an image keeps before recompression. Default: 800.
    ///
    /// Only governs the bytes embedded in the document; the displayed size is
    /// always [`Self::footprint`].
    pub max_dimension: u32,

    /// Lossy recompression quality factor in (0, 1]. Default: 0.7.
    pub quality: f32,

    /// Cells per grid row. Default: 3.
    pub columns: usize,

    /// Behaviour for an empty input list. Default: [`EmptyBatchPolicy::EmptyDocument`].
    pub empty_batch: EmptyBatchPolicy,

    /// Suggested file name for the artifact. Default: `images.docx`.
    pub output_file_name: String,

    /// Receives per-item progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Observable `(current, total)` state. Clones share one channel, so
    /// subscribe before starting the conversion. A tracker serves one run at
    /// a time; configs used concurrently need their own tracker.
    pub progress: ProgressTracker,

    /// Polled between files; when set to `true` the batch aborts.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            footprint: Footprint::default(),
            max_dimension: 800,
            quality: DEFAULT_QUALITY,
            columns: 3,
            empty_batch: EmptyBatchPolicy::default(),
            output_file_name: "images.docx".to_string(),
            progress_callback: None,
            progress: ProgressTracker::new(),
            cancel_flag: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("footprint", &self.footprint)
            .field("max_dimension", &self.max_dimension)
            .field("quality", &self.quality)
            .field("columns", &self.columns)
            .field("empty_batch", &self.empty_batch)
            .field("output_file_name", &self.output_file_name)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .field("progress", &self.progress.snapshot())
            .field("cancel_flag", &self.cancel_flag.is_some())
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// JPEG encoder quality (1–100) derived from [`Self::quality`].
    ///
    /// A non-finite quality (set on the public field, bypassing the builder)
    /// falls back to the default 0.7.
    pub fn jpeg_quality(&self) -> u8 {
        let q = if self.quality.is_finite() {
            self.quality
        } else {
            DEFAULT_QUALITY
        };
        (q * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn footprint(mut self, footprint: Footprint) -> Self {
        self.config.footprint = footprint;
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px.max(1);
        self
    }

    pub fn quality(mut self, q: f32) -> Self {
        self.config.quality = q.clamp(0.01, 1.0);
        self
    }

    pub fn columns(mut self, n: usize) -> Self {
        self.config.columns = n.max(1);
        self
    }

    pub fn empty_batch(mut self, policy: EmptyBatchPolicy) -> Self {
        self.config.empty_batch = policy;
        self
    }

    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn progress_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.config.progress = tracker;
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel_flag = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Images2DocxError> {
        let c = &self.config;
        if c.footprint.width == 0 || c.footprint.height == 0 {
            return Err(Images2DocxError::InvalidConfig(format!(
                "Footprint must be at least 1×1 px, got {}×{}",
                c.footprint.width, c.footprint.height
            )));
        }
        if !(c.quality > 0.0 && c.quality <= 1.0) {
            return Err(Images2DocxError::InvalidConfig(format!(
                "Quality must be in (0, 1], got {}",
                c.quality
            )));
        }
        if c.output_file_name.trim().is_empty() {
            return Err(Images2DocxError::InvalidConfig(
                "Output file name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_layout() {
        let c = ConversionConfig::default();
        assert_eq!(c.footprint, Footprint::new(128, 170));
        assert_eq!(c.max_dimension, 800);
        assert_eq!(c.columns, 3);
        assert_eq!(c.jpeg_quality(), 70);
        assert_eq!(c.output_file_name, "images.docx");
        assert_eq!(c.empty_batch, EmptyBatchPolicy::EmptyDocument);
    }

    #[test]
    fn jpeg_quality_survives_unchecked_fields() {
        let mut c = ConversionConfig::default();
        c.quality = f32::NAN;
        assert_eq!(c.jpeg_quality(), 70);
        c.quality = f32::INFINITY;
        assert_eq!(c.jpeg_quality(), 70);
        c.quality = -3.0;
        assert_eq!(c.jpeg_quality(), 1);
        c.quality = 0.0;
        assert_eq!(c.jpeg_quality(), 1);
    }

    #[test]
    fn builder_clamps_degenerate_values() {
        let c = ConversionConfig::builder()
            .columns(0)
            .max_dimension(0)
            .quality(7.0)
            .build()
            .unwrap();
        assert_eq!(c.columns, 1);
        assert_eq!(c.max_dimension, 1);
        assert_eq!(c.jpeg_quality(), 100);
    }

    #[test]
    fn zero_footprint_is_rejected() {
        let err = ConversionConfig::builder()
            .footprint(Footprint::new(0, 100))
            .build()
            .unwrap_err();
        assert!(matches!(err, Images2DocxError::InvalidConfig(_)));
    }

    #[test]
    fn blank_file_name_is_rejected() {
        let err = ConversionConfig::builder()
            .output_file_name("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("file name"));
    }

    #[test]
    fn debug_hides_callback() {
        let c = ConversionConfig::builder()
            .progress_callback(Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let s = format!("{c:?}");
        assert!(s.contains("<dyn BatchProgressCallback>"));
    }
}
