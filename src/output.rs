//! Result types returned by downloads, probes, exports and the index.
//!
//! Batch operations never collapse failures into a boolean: each report keeps
//! the typed error of every item that failed, next to the items that worked,
//! in the order they were attempted.

use crate::error::CatalogError;
use dd2vtt::{CodecError, MapInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ── Downloads ────────────────────────────────────────────────────────────

/// A map saved to disk by the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedMap {
    pub category: String,
    /// File stem, e.g. `simple-beach`.
    pub name: String,
    pub dd2vtt_path: PathBuf,
    /// Set when the optional `.md` description was fetched too.
    pub description_path: Option<PathBuf>,
}

/// A map that could not be downloaded.
#[derive(Debug)]
pub struct MapFailure {
    pub name: String,
    pub error: CatalogError,
}

/// Outcome of downloading one category.
#[derive(Debug, Default)]
pub struct CategoryReport {
    pub category: String,
    /// `.dd2vtt` files listed in the category.
    pub available: usize,
    /// Files actually attempted (after the limit).
    pub attempted: usize,
    pub downloaded: Vec<DownloadedMap>,
    pub failures: Vec<MapFailure>,
}

impl CategoryReport {
    pub fn downloaded_count(&self) -> usize {
        self.downloaded.len()
    }
}

/// Outcome of downloading several categories, in the order requested.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub categories: Vec<(String, Result<CategoryReport, CatalogError>)>,
}

impl DownloadSummary {
    /// Maps downloaded across all categories.
    pub fn total_downloaded(&self) -> usize {
        self.categories
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(CategoryReport::downloaded_count)
            .sum()
    }

    /// Per-category download count; failed listings count as 0.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.categories
            .iter()
            .map(|(c, r)| (c.as_str(), r.as_ref().map_or(0, CategoryReport::downloaded_count)))
            .collect()
    }

    /// Failed listings plus failed maps.
    pub fn failure_count(&self) -> usize {
        self.categories
            .iter()
            .map(|(_, r)| r.as_ref().map_or(1, |rep| rep.failures.len()))
            .sum()
    }

    /// Categories whose listing failed.
    pub fn failed_categories(&self) -> impl Iterator<Item = (&str, &CatalogError)> {
        self.categories
            .iter()
            .filter_map(|(c, r)| r.as_ref().err().map(|e| (c.as_str(), e)))
    }
}

/// Number of `.dd2vtt` maps available per category.
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub counts: Vec<(String, Result<usize, CatalogError>)>,
}

impl ProbeReport {
    /// Sum over categories that could be listed.
    pub fn total(&self) -> usize {
        self.counts.iter().filter_map(|(_, r)| r.as_ref().ok()).sum()
    }
}

// ── Local library ────────────────────────────────────────────────────────

/// A `.dd2vtt` file found in the local maps folder.
#[derive(Debug)]
pub struct MapEntry {
    pub name: String,
    /// Name of the parent folder.
    pub category: String,
    pub path: PathBuf,
    /// Grid metadata, or why the file could not be read.
    pub info: Result<MapInfo, CodecError>,
}

impl MapEntry {
    /// `"30x20"`, or `"unreadable"` when the file failed to parse.
    pub fn grid_label(&self) -> String {
        match &self.info {
            Ok(info) => info.grid_label(),
            Err(_) => "unreadable".to_string(),
        }
    }
}

/// A map exported to PNG.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedMap {
    pub name: String,
    pub category: String,
    pub source: PathBuf,
    pub png_path: PathBuf,
    pub info: MapInfo,
    /// Format of the embedded image before export, e.g. `png`, `webp`.
    pub embedded_format: String,
    pub width: u32,
    pub height: u32,
}

/// Result for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<ExportedMap, CodecError>,
}

/// Outcomes of a batch export, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn successes(&self) -> impl Iterator<Item = &ExportedMap> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &CodecError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.path, e)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

// ── Index ────────────────────────────────────────────────────────────────

/// One row of `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub dd2vtt_file: String,
    pub has_description: bool,
}

/// `category -> maps`, serialised as `index.json`.
pub type MapIndex = BTreeMap<String, Vec<IndexEntry>>;
