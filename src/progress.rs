//! Progress reporting for a batch conversion.
//!
//! Two complementary surfaces:
//!
//! * [`ProgressTracker`] publishes a [`ProgressState`] on a
//!   `tokio::sync::watch` channel. A UI can `subscribe()` and poll or await
//!   changes; it always sees the latest `(current, total)` pair.
//! * [`BatchProgressCallback`] receives discrete events (item started,
//!   finished, failed). Inject one via
//!   [`crate::config::ConversionConfigBuilder::progress_callback`].
//!
//! Items are processed strictly one at a time, so events arrive in input
//! order and `current` only ever grows by one until the batch ends, when the
//! state resets to `(0, 0)` whatever the outcome.
//!
//! # Example
//!
//! ```rust
//! use images2docx::{BatchProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, encoded_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Image {}/{} done ({} bytes)", index, total, encoded_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Images2DocxError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// How far the current batch has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    /// Items normalized so far.
    pub current: usize,
    /// Items in the batch.
    pub total: usize,
}

impl ProgressState {
    pub const IDLE: ProgressState = ProgressState {
        current: 0,
        total: 0,
    };

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

/// Owner of the observable [`ProgressState`].
///
/// Cloning shares the underlying channel, so a clone handed to a UI thread
/// sees the same updates the orchestrator publishes. One batch at a time may
/// report to a tracker: a second conversion started on the same tracker
/// while the first is running fails with
/// [`Images2DocxError::TrackerBusy`]. Give concurrent conversions their own
/// tracker via [`crate::config::ConversionConfigBuilder::progress_tracker`].
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: Arc<watch::Sender<ProgressState>>,
    running: Arc<AtomicBool>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::IDLE);
        Self {
            tx: Arc::new(tx),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ProgressState {
        *self.tx.borrow()
    }

    /// Whether a batch currently holds this tracker.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the tracker for a batch of `total` items and publish `(0, total)`.
    pub(crate) fn begin(&self, total: usize) -> Result<ProgressRun, Images2DocxError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Images2DocxError::TrackerBusy)?;
        self.tx.send_replace(ProgressState { current: 0, total });
        Ok(ProgressRun {
            tracker: self.clone(),
        })
    }
}

/// Exclusive claim on a [`ProgressTracker`] for one batch.
///
/// Dropping it publishes [`ProgressState::IDLE`] and releases the tracker,
/// so the reset also happens when the conversion future is dropped midway.
#[derive(Debug)]
pub(crate) struct ProgressRun {
    tracker: ProgressTracker,
}

impl ProgressRun {
    pub(crate) fn advance(&self) {
        self.tracker.tx.send_modify(|s| {
            if s.current < s.total {
                s.current += 1;
            }
        });
    }
}

impl Drop for ProgressRun {
    fn drop(&mut self) {
        self.tracker.tx.send_replace(ProgressState::IDLE);
        self.tracker.running.store(false, Ordering::Release);
    }
}

/// Called by the orchestrator as it processes each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first image is decoded.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before an image enters the codec gateway.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an image has been normalized.
    ///
    /// * `encoded_len` — byte length of the recompressed JPEG
    fn on_item_complete(&self, index: usize, total: usize, encoded_len: usize) {
        let _ = (index, total, encoded_len);
    }

    /// Called when an image could not be loaded. The batch aborts right after.
    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after the document has been assembled.
    fn on_batch_complete(&self, total: usize) {
        let _ = total;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
