//! Remote catalog: listing, probing and downloading maps.
//!
//! ```text
//! client ──▶ probe       (count maps per category)
//!    │
//!    └────▶ download    (list → filter → fetch → save → throttle)
//! ```
//!
//! 1. [`client`]: HTTP GET + JSON decode against the listing service
//! 2. [`probe`]: per-category map counts
//! 3. [`download`]: sequential, throttled downloads into `maps/{category}/`

pub mod client;
pub mod download;
pub mod probe;

pub use client::{filter_maps, CatalogClient, CatalogEntry, EntryKind};
pub use download::{Downloader, SAMPLE_PER_CATEGORY};
pub use probe::{probe, probe_all};
