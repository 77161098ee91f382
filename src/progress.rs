//! Progress-callback trait for batch downloads and exports.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::CatalogConfigBuilder::progress_callback`] or
//! [`crate::config::LibraryConfigBuilder::progress_callback`] to receive an
//! event for every map as a batch walks through it.
//!
//! # Example
//!
//! ```rust
//! use vtt_maps::{BatchProgressCallback, LibraryConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, name: &str) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index, total, name);
//!     }
//! }
//!
//! let config = LibraryConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called as a batch (one category download, or an export run) processes
/// each item.
///
/// All methods default to no-ops. Indices are 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first item.
    ///
    /// * `label`: what the batch is about, e.g. a category name
    /// * `total`: number of items that will be attempted
    fn on_batch_start(&self, label: &str, total: usize) {
        let _ = (label, total);
    }

    /// Called before an item is processed.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item succeeded.
    fn on_item_complete(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item failed; the batch carries on.
    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every item has been attempted.
    fn on_batch_complete(&self, label: &str, total: usize, success_count: usize) {
        let _ = (label, total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in the configs.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
