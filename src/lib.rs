//! # vtt-maps
//!
//! Discover, download, and view DD2VTT battle maps published in a GitHub
//! repository (by default [mbround18/vtt-maps](https://github.com/mbround18/vtt-maps)).
//!
//! ## Components
//!
//! ```text
//! GitHub contents API ──▶ catalog::client ──▶ catalog::download ──▶ maps/{category}/*.dd2vtt
//!                               │                                        │
//!                               └──▶ catalog::probe                      ├──▶ library (list / export / preview)
//!                                                                        └──▶ index   (maps/index.json)
//! ```
//!
//! The format itself is handled by the [`dd2vtt`] crate, re-exported here.
//! Everything local is synchronous; only the catalog talks to the network
//! (async, via reqwest + tokio), strictly one request at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vtt_maps::{CatalogClient, CatalogConfig, Downloader, LibraryConfig, MapLibrary};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(CatalogConfig::default())?;
//!     let summary = Downloader::new(client).download_sample().await;
//!     eprintln!("downloaded {} maps", summary.total_downloaded());
//!
//!     let library = MapLibrary::new(LibraryConfig::default());
//!     let report = library.export_all()?;
//!     eprintln!("{} exported, {} failed", report.success_count(), report.failure_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vttmaps` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod library;
pub mod output;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{probe, probe_all, CatalogClient, CatalogEntry, Downloader, EntryKind};
pub use config::{CatalogConfig, CatalogConfigBuilder, LibraryConfig, LibraryConfigBuilder};
pub use dd2vtt::{self, CodecError, Document, MapInfo, RasterImage};
pub use error::{CatalogError, ConfigError, LibraryError};
pub use library::MapLibrary;
pub use output::{
    BatchReport, CategoryReport, DownloadSummary, DownloadedMap, ExportedMap, FileOutcome,
    IndexEntry, MapEntry, MapFailure, MapIndex, ProbeReport,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
