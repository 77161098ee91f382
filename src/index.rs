//! `index.json`: a catalogue of downloaded maps per category.
//!
//! Only the direct category folders of the maps root are scanned. The output
//! shape is
//!
//! ```json
//! {
//!   "beach": [
//!     { "name": "simple-beach", "dd2vtt_file": "maps/beach/simple-beach.dd2vtt", "has_description": true }
//!   ]
//! }
//! ```

use crate::error::LibraryError;
use crate::library::{is_map_file, map_name, MapLibrary};
use crate::output::{IndexEntry, MapIndex};
use std::path::{Path, PathBuf};
use tracing::info;

impl MapLibrary {
    /// Scan `{maps_dir}/{category}/*.dd2vtt` and build the index.
    ///
    /// Categories without maps are left out.
    pub fn build_index(&self) -> Result<MapIndex, LibraryError> {
        let root = self.root();
        if !root.is_dir() {
            return Err(LibraryError::MapsDirMissing {
                path: root.to_path_buf(),
            });
        }

        let mut index = MapIndex::new();
        for dir in sorted_children(root)?.into_iter().filter(|p| p.is_dir()) {
            let maps: Vec<IndexEntry> = sorted_children(&dir)?
                .into_iter()
                .filter(|p| is_map_file(p) && p.is_file())
                .map(|p| IndexEntry {
                    name: map_name(&p),
                    has_description: p.with_extension("md").is_file(),
                    dd2vtt_file: p.display().to_string(),
                })
                .collect();

            if !maps.is_empty() {
                let category = dir
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                index.insert(category, maps);
            }
        }
        Ok(index)
    }

    /// Build the index and write it as pretty JSON to the configured path.
    pub fn write_index(&self) -> Result<(PathBuf, MapIndex), LibraryError> {
        let index = self.build_index()?;
        let path = self.config().index_path();
        let json = serde_json::to_string_pretty(&index)?;
        std::fs::write(&path, json).map_err(|source| LibraryError::IndexWrite {
            path: path.clone(),
            source,
        })?;

        let total: usize = index.values().map(Vec::len).sum();
        info!("Index created: {} ({} maps)", path.display(), total);
        Ok((path, index))
    }
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    let scan_err = |source| LibraryError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let mut children = std::fs::read_dir(dir)
        .map_err(scan_err)?
        .map(|e| e.map(|e| e.path()).map_err(scan_err))
        .collect::<Result<Vec<_>, _>>()?;
    children.sort();
    Ok(children)
}
