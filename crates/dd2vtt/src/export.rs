//! Export the embedded image as a standalone PNG file.
//!
//! PNG payloads are written byte-for-byte as embedded; anything else is
//! re-encoded to PNG. Both paths are pure functions of the embedded bytes, so
//! exporting the same document twice yields identical files.
//!
//! Writes are atomic: data goes to `<dest>.tmp` in the same directory and is
//! then renamed over the destination, so a crash never leaves a truncated
//! PNG behind. Parent directories are the caller's responsibility.

use crate::document::Document;
use crate::error::CodecError;
use crate::raster::{extract_image, format_name, RasterImage};
use image::ImageFormat;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extract the document's image and write it to `destination` as PNG.
///
/// Returns the path written.
pub fn export_to_file(
    doc: &Document,
    destination: impl AsRef<Path>,
) -> Result<PathBuf, CodecError> {
    let raster = extract_image(doc)?;
    export_raster(&raster, destination)
}

/// Write an already extracted image to `destination` as PNG.
pub fn export_raster(
    raster: &RasterImage,
    destination: impl AsRef<Path>,
) -> Result<PathBuf, CodecError> {
    let path = destination.as_ref();
    let bytes = png_bytes(raster)?;
    write_atomic(path, &bytes)?;
    debug!("Exported {} bytes → {}", bytes.len(), path.display());
    Ok(path.to_path_buf())
}

/// PNG encoding of the raster: the embedded bytes when they already are PNG,
/// a fresh encode otherwise.
pub fn png_bytes(raster: &RasterImage) -> Result<Vec<u8>, CodecError> {
    if raster.format == ImageFormat::Png {
        return Ok(raster.encoded.clone());
    }

    debug!("Re-encoding {} image as PNG", format_name(raster.format));
    let mut buf = Vec::new();
    raster
        .image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CodecError::UnsupportedOrCorruptImage {
            detail: format!("PNG re-encode of {} image failed: {e}", raster.format_name()),
        })?;
    Ok(buf)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    let fail = |source| CodecError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    std::fs::write(&tmp_path, bytes).map_err(fail)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(fail(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn jpeg_raster() -> RasterImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 100, 50])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .expect("jpeg encode");
        crate::raster::decode_raster(buf).expect("decode jpeg")
    }

    #[test]
    fn non_png_is_reencoded() {
        let raster = jpeg_raster();
        assert_eq!(raster.format, ImageFormat::Jpeg);
        let png = png_bytes(&raster).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn missing_parent_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("map.png");
        let err = export_raster(&jpeg_raster(), &dest).unwrap_err();
        assert!(matches!(err, CodecError::WriteFailure { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("map.png");
        export_raster(&jpeg_raster(), &dest).unwrap();
        assert!(dest.exists());
        assert!(!dir.path().join("map.png.tmp").exists());
    }
}
