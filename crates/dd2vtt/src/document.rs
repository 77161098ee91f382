//! DD2VTT document model: JSON parsing and grid metadata.
//!
//! A `.dd2vtt` file is a JSON object exported by Dungeondraft. Only three
//! parts of it matter here:
//!
//! ```text
//! {
//!   "format": 0.3,
//!   "resolution": {
//!     "map_origin": { "x": 0, "y": 0 },
//!     "map_size": { "x": 30, "y": 20 },
//!     "pixels_per_grid": 256
//!   },
//!   "image": "iVBORw0KGgo…"          // base64-encoded raster
//!   …                                // walls, portals, lights: ignored
//! }
//! ```
//!
//! Grid metadata is display-only, so every metadata field is deserialised
//! leniently: a missing, `null`, or wrongly-typed value becomes `None` rather
//! than failing the whole document. Only invalid JSON is fatal at this stage.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A parsed DD2VTT document.
///
/// Read-only: the codec never writes a document back out.
#[derive(Clone, Default, Deserialize)]
pub struct Document {
    /// Format/version marker, passed through untouched.
    #[serde(default)]
    pub format: Option<Value>,

    /// Grid alignment block.
    #[serde(default, deserialize_with = "lenient")]
    pub resolution: Option<Resolution>,

    /// Base64-encoded raster image.
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
}

impl fmt::Debug for Document {
    // The image field is megabytes of base64; print its length instead.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("format", &self.format)
            .field("resolution", &self.resolution)
            .field("image", &self.image.as_ref().map(|s| format!("<{} bytes base64>", s.len())))
            .finish()
    }
}

/// The `resolution` block of a DD2VTT document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Resolution {
    /// Top-left corner of the map in grid units.
    #[serde(default, deserialize_with = "lenient")]
    pub map_origin: Option<GridPoint>,

    /// Map dimensions in grid cells.
    #[serde(default, deserialize_with = "lenient")]
    pub map_size: Option<GridSize>,

    /// Pixel edge length of one grid cell.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub pixels_per_grid: Option<u32>,
}

/// Grid dimensions; either axis may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct GridSize {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub x: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub y: Option<u32>,
}

/// A position in grid units. Fractional values are allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct GridPoint {
    #[serde(default, deserialize_with = "lenient")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub y: Option<f64>,
}

/// Grid metadata summary returned by [`describe`].
///
/// Each field is independently known or unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    pub grid_width: Option<u32>,
    pub grid_height: Option<u32>,
    pub pixels_per_grid: Option<u32>,
}

impl MapInfo {
    /// `"30x20"`, with `unknown` standing in for a missing axis.
    pub fn grid_label(&self) -> String {
        format!("{}x{}", label(self.grid_width), label(self.grid_height))
    }

    /// Expected raster size in pixels, when all three values are known.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        let ppg = self.pixels_per_grid?;
        Some((
            self.grid_width?.checked_mul(ppg)?,
            self.grid_height?.checked_mul(ppg)?,
        ))
    }

    /// True when no metadata at all was present.
    pub fn is_unknown(&self) -> bool {
        self.grid_width.is_none() && self.grid_height.is_none() && self.pixels_per_grid.is_none()
    }
}

impl fmt::Display for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {}px per square",
            self.grid_label(),
            label(self.pixels_per_grid)
        )
    }
}

fn label(v: Option<u32>) -> String {
    v.map_or_else(|| "unknown".to_string(), |n| n.to_string())
}

/// Parse raw file contents into a [`Document`].
///
/// A leading UTF-8 BOM is tolerated. Anything that is not a JSON object
/// fails with [`CodecError::MalformedDocument`].
pub fn parse(raw: &[u8]) -> Result<Document, CodecError> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let doc: Document =
        serde_json::from_slice(raw).map_err(|source| CodecError::MalformedDocument { source })?;
    debug!(
        "Parsed DD2VTT document: image={}, resolution={}",
        doc.image.is_some(),
        doc.resolution.is_some()
    );
    Ok(doc)
}

/// Read a `.dd2vtt` file from disk and [`parse`] it.
pub fn read_document(path: impl AsRef<Path>) -> Result<Document, CodecError> {
    let path = path.as_ref();
    let raw = std::fs::read(path).map_err(|source| CodecError::ReadFailure {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&raw)
}

/// Summarise the grid metadata of a document. Never fails.
pub fn describe(doc: &Document) -> MapInfo {
    let Some(res) = doc.resolution.as_ref() else {
        return MapInfo::default();
    };
    let size = res.map_size.unwrap_or_default();
    MapInfo {
        grid_width: size.x,
        grid_height: size.y,
        pixels_per_grid: res.pixels_per_grid,
    }
}

// ── Lenient field deserialisers ──────────────────────────────────────────

/// Accept any JSON value; keep it only if it converts to `T`.
fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(de)?;
    Ok(serde_json::from_value(value).ok())
}

/// Accept non-negative integers and integral floats (`30.0`) that fit in a `u32`.
fn lenient_u32<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    let n = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64)
    });
    Ok(n.and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_resolution_block() {
        let doc = parse(
            br#"{"format":0.3,"resolution":{"map_origin":{"x":0,"y":0.5},
                "map_size":{"x":30,"y":20},"pixels_per_grid":256},"image":"AAAA"}"#,
        )
        .unwrap();
        let res = doc.resolution.as_ref().unwrap();
        assert_eq!(res.map_size, Some(GridSize { x: Some(30), y: Some(20) }));
        assert_eq!(res.pixels_per_grid, Some(256));
        assert_eq!(res.map_origin.unwrap().y, Some(0.5));
        assert_eq!(doc.format, Some(serde_json::json!(0.3)));
        assert_eq!(doc.image.as_deref(), Some("AAAA"));
    }

    #[test]
    fn describe_reports_each_field_independently() {
        let doc = parse(br#"{"resolution":{"map_size":{"x":12},"pixels_per_grid":70}}"#).unwrap();
        let info = describe(&doc);
        assert_eq!(info.grid_width, Some(12));
        assert_eq!(info.grid_height, None);
        assert_eq!(info.pixels_per_grid, Some(70));
        assert_eq!(info.grid_label(), "12xunknown");
        assert_eq!(info.pixel_size(), None);
    }

    #[test]
    fn describe_without_resolution_is_all_unknown() {
        let doc = parse(br#"{"image":"AAAA"}"#).unwrap();
        let info = describe(&doc);
        assert!(info.is_unknown());
        assert_eq!(info.to_string(), "unknownxunknown @ unknownpx per square");
    }

    #[test]
    fn wrongly_typed_metadata_is_treated_as_absent() {
        let doc = parse(
            br#"{"resolution":{"map_size":{"x":"thirty","y":-4},"pixels_per_grid":null},"image":"AAAA"}"#,
        )
        .unwrap();
        assert_eq!(describe(&doc), MapInfo::default());
        assert!(doc.image.is_some());
    }

    #[test]
    fn non_object_resolution_is_ignored() {
        let doc = parse(br#"{"resolution":[1,2,3]}"#).unwrap();
        assert!(doc.resolution.is_none());
    }

    #[test]
    fn integral_floats_are_accepted() {
        let doc = parse(br#"{"resolution":{"map_size":{"x":30.0,"y":20.5},"pixels_per_grid":100}}"#)
            .unwrap();
        let info = describe(&doc);
        assert_eq!(info.grid_width, Some(30));
        assert_eq!(info.grid_height, None);
        assert_eq!(info.pixel_size(), None);
    }

    #[test]
    fn pixel_size_multiplies_grid_by_scale() {
        let info = MapInfo {
            grid_width: Some(30),
            grid_height: Some(20),
            pixels_per_grid: Some(100),
        };
        assert_eq!(info.pixel_size(), Some((3000, 2000)));
        assert_eq!(info.to_string(), "30x20 @ 100px per square");
    }

    #[test]
    fn non_string_image_is_absent() {
        let doc = parse(br#"{"image":42}"#).unwrap();
        assert!(doc.image.is_none());
    }

    #[test]
    fn bom_prefixed_json_parses() {
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice(br#"{"image":"AAAA"}"#);
        assert!(parse(&raw).unwrap().image.is_some());
    }

    #[test]
    fn json_array_is_malformed() {
        let err = parse(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, CodecError::MalformedDocument { .. }));
    }

    #[test]
    fn debug_does_not_dump_image() {
        let doc = Document {
            image: Some("A".repeat(4096)),
            ..Default::default()
        };
        let dbg = format!("{doc:?}");
        assert!(dbg.contains("<4096 bytes base64>"));
        assert!(dbg.len() < 256);
    }

    #[test]
    fn read_document_missing_file() {
        let err = read_document("/definitely/not/here.dd2vtt").unwrap_err();
        assert!(matches!(err, CodecError::ReadFailure { .. }));
    }
}
