//! # dd2vtt
//!
//! Read [Dungeondraft](https://dungeondraft.net/) `.dd2vtt` battle-map
//! exports: parse the JSON container, report its grid metadata, and pull out
//! the embedded raster image.
//!
//! ## Operations
//!
//! ```text
//! bytes ──parse──▶ Document ──describe──▶ MapInfo        (never fails)
//!                     │
//!                     ├──extract_image──▶ RasterImage    (base64 + sniff + decode)
//!                     └──export_to_file─▶ PNG on disk    (atomic, idempotent)
//! ```
//!
//! Every operation is a pure, synchronous, single-shot transformation. There
//! is no caching and no retrying; a failure on the same input always
//! reproduces.
//!
//! ## Example
//!
//! ```rust,no_run
//! let doc = dd2vtt::read_document("maps/beach/simple-beach.dd2vtt")?;
//! println!("Grid: {}", dd2vtt::describe(&doc));
//!
//! let raster = dd2vtt::extract_image(&doc)?;
//! println!("{} {}x{}", raster.format_name(), raster.width(), raster.height());
//!
//! dd2vtt::export_to_file(&doc, "simple-beach.png")?;
//! # Ok::<(), dd2vtt::CodecError>(())
//! ```

pub mod document;
pub mod error;
pub mod export;
pub mod raster;

pub use document::{describe, parse, read_document, Document, GridPoint, GridSize, MapInfo, Resolution};
pub use error::CodecError;
pub use export::{export_raster, export_to_file, png_bytes};
pub use raster::{decode_raster, extract_image, format_name, RasterImage};

// Re-exported so callers can match on `RasterImage::format` without a
// direct `image` dependency.
pub use image::ImageFormat;
