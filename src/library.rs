//! Local map library: find downloaded `.dd2vtt` files, list them, export them.
//!
//! Layout on disk:
//!
//! ```text
//! maps/
//!  ├─ index.json
//!  ├─ beach/
//!  │   ├─ simple-beach.dd2vtt
//!  │   ├─ simple-beach.md
//!  │   └─ exported_pngs/simple-beach.png
//!  └─ taverns/…
//! ```
//!
//! The category of a map is the name of the folder it sits in. Batch exports
//! are isolated per file: a broken map produces an `Err` outcome and the
//! batch continues with the next one.

use crate::config::LibraryConfig;
use crate::error::LibraryError;
use crate::output::{BatchReport, ExportedMap, FileOutcome, MapEntry};
use dd2vtt::{CodecError, MapInfo};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info, warn};

const MAP_EXTENSION: &str = "dd2vtt";

/// True for paths ending in `.dd2vtt`.
pub fn is_map_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == MAP_EXTENSION)
}

/// File stem as a `String` (`simple-beach` for `simple-beach.dd2vtt`).
pub fn map_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Name of the folder containing the map.
pub fn map_category(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Maps stored under a local folder.
#[derive(Debug, Clone)]
pub struct MapLibrary {
    config: LibraryConfig,
}

impl MapLibrary {
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.maps_dir
    }

    /// Every `.dd2vtt` file under the maps folder, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>, LibraryError> {
        let root = self.root();
        if !root.is_dir() {
            return Err(LibraryError::MapsDirMissing {
                path: root.to_path_buf(),
            });
        }
        let mut found = Vec::new();
        walk(root, &mut found)?;
        found.sort();
        debug!("Discovered {} maps under {}", found.len(), root.display());
        Ok(found)
    }

    /// Local maps grouped by category, with their grid metadata.
    pub fn list_maps(&self) -> Result<BTreeMap<String, Vec<MapEntry>>, LibraryError> {
        let mut by_category: BTreeMap<String, Vec<MapEntry>> = BTreeMap::new();
        for path in self.discover()? {
            let info = dd2vtt::read_document(&path).map(|doc| dd2vtt::describe(&doc));
            if let Err(ref e) = info {
                warn!("Cannot read {}: {}", path.display(), e);
            }
            let entry = MapEntry {
                name: map_name(&path),
                category: map_category(&path),
                path,
                info,
            };
            by_category.entry(entry.category.clone()).or_default().push(entry);
        }
        Ok(by_category)
    }

    /// Maps in display order: categories alphabetically, then by path.
    ///
    /// Position `i` in the returned list is map number `i + 1` in listings.
    pub fn numbered_maps(&self) -> Result<Vec<MapEntry>, LibraryError> {
        Ok(self.list_maps()?.into_values().flatten().collect())
    }

    /// `{parent}/{export_dir_name}/{stem}.png`
    pub fn export_path_for(&self, source: &Path) -> PathBuf {
        let parent = source.parent().unwrap_or_else(|| Path::new("."));
        parent
            .join(&self.config.export_dir_name)
            .join(format!("{}.png", map_name(source)))
    }

    /// Export one map to an explicit destination, creating its parent folder.
    pub fn export_map(&self, source: &Path, destination: &Path) -> Result<ExportedMap, CodecError> {
        let doc = dd2vtt::read_document(source)?;
        let info = dd2vtt::describe(&doc);
        let raster = dd2vtt::extract_image(&doc)?;

        if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| CodecError::WriteFailure {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let png_path = dd2vtt::export_raster(&raster, destination)?;

        Ok(ExportedMap {
            name: map_name(source),
            category: map_category(source),
            source: source.to_path_buf(),
            png_path,
            info,
            embedded_format: raster.format_name().to_string(),
            width: raster.width(),
            height: raster.height(),
        })
    }

    /// Export one map to its default location.
    pub fn export_one(&self, source: &Path) -> Result<ExportedMap, CodecError> {
        self.export_map(source, &self.export_path_for(source))
    }

    /// Export the given files in order. Never stops early.
    pub fn export_files(&self, paths: &[PathBuf]) -> BatchReport {
        let total = paths.len();
        let progress = self.config.progress_callback.clone();
        if let Some(ref cb) = progress {
            cb.on_batch_start("export", total);
        }

        let mut report = BatchReport::default();
        for (i, path) in paths.iter().enumerate() {
            let index = i + 1;
            let name = map_name(path);
            if let Some(ref cb) = progress {
                cb.on_item_start(index, total, &name);
            }

            let result = self.export_one(path);
            match &result {
                Ok(map) => {
                    info!("Exported {} → {}", path.display(), map.png_path.display());
                    if let Some(ref cb) = progress {
                        cb.on_item_complete(index, total, &name);
                    }
                }
                Err(e) => {
                    warn!("Failed to export {}: {}", path.display(), e);
                    if let Some(ref cb) = progress {
                        cb.on_item_error(index, total, &name, &e.to_string());
                    }
                }
            }
            report.outcomes.push(FileOutcome {
                path: path.clone(),
                result,
            });
        }

        if let Some(ref cb) = progress {
            cb.on_batch_complete("export", total, report.success_count());
        }
        report
    }

    /// Export every map in the library.
    pub fn export_all(&self) -> Result<BatchReport, LibraryError> {
        let paths = self.discover()?;
        Ok(self.export_files(&paths))
    }

    /// Write the map as PNG to a fresh temporary file for viewing.
    ///
    /// The file is deleted when the returned [`TempPath`] is dropped; call
    /// [`TempPath::keep`] to hand it to an external viewer.
    pub fn preview(&self, source: &Path) -> Result<(MapInfo, TempPath), CodecError> {
        let doc = dd2vtt::read_document(source)?;
        let info = dd2vtt::describe(&doc);
        let raster = dd2vtt::extract_image(&doc)?;
        let bytes = dd2vtt::png_bytes(&raster)?;

        let temp_fail = |source| CodecError::WriteFailure {
            path: std::env::temp_dir(),
            source,
        };
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", map_name(source)))
            .suffix(".png")
            .tempfile()
            .map_err(temp_fail)?;
        file.write_all(&bytes).map_err(temp_fail)?;
        file.flush().map_err(temp_fail)?;

        Ok((info, file.into_temp_path()))
    }
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), LibraryError> {
    let scan_err = |source| LibraryError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(scan_err)?;
        if file_type.is_dir() {
            walk(&path, found)?;
        } else if is_map_file(&path) && path.is_file() {
            found.push(path);
        }
    }
    Ok(())
}
