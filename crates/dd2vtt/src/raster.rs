//! Embedded raster extraction: base64 → bytes → sniffed, decoded image.
//!
//! The file extension says nothing about what Dungeondraft embedded. The
//! format is identified from the magic bytes via [`image::guess_format`] and
//! reported back to the caller instead of assuming PNG.

use crate::document::Document;
use crate::error::CodecError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// A decoded embedded image together with the bytes it was decoded from.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Decoded pixels.
    pub image: DynamicImage,
    /// Format identified from the encoded bytes.
    pub format: ImageFormat,
    /// The original encoded bytes (after base64 decoding).
    pub encoded: Vec<u8>,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Lower-case name of the sniffed format, e.g. `"png"`.
    pub fn format_name(&self) -> &'static str {
        format_name(self.format)
    }
}

/// Lower-case display name for an image format.
pub fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("unknown")
}

/// Extract and decode the raster image embedded in a document.
///
/// # Errors
/// - [`CodecError::MissingImageField`]: `image` absent or blank
/// - [`CodecError::InvalidEncoding`]: `image` is not base64
/// - [`CodecError::UnsupportedOrCorruptImage`]: bytes are not a readable raster
pub fn extract_image(doc: &Document) -> Result<RasterImage, CodecError> {
    let b64 = doc
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(CodecError::MissingImageField)?;

    let encoded = decode_base64(b64)?;
    debug!("Decoded embedded image → {} bytes", encoded.len());
    decode_raster(encoded)
}

/// Decode the base64 payload, ignoring line wrapping and an optional
/// `data:image/…;base64,` prefix.
fn decode_base64(b64: &str) -> Result<Vec<u8>, CodecError> {
    let payload = match b64.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, data)| data),
        None => b64,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| CodecError::InvalidEncoding { source })
}

/// Identify and decode raw raster bytes.
pub fn decode_raster(encoded: Vec<u8>) -> Result<RasterImage, CodecError> {
    let format = image::guess_format(&encoded).map_err(|e| CodecError::UnsupportedOrCorruptImage {
        detail: format!("unrecognised image signature: {e}"),
    })?;

    let image = image::load_from_memory_with_format(&encoded, format).map_err(|e| {
        CodecError::UnsupportedOrCorruptImage {
            detail: format!("{} decode failed: {e}", format_name(format)),
        }
    })?;

    debug!(
        "Embedded image is {} {}x{}",
        format_name(format),
        image.width(),
        image.height()
    );

    Ok(RasterImage {
        image,
        format,
        encoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    fn doc_with_image(image: &str) -> Document {
        Document {
            image: Some(image.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_png() {
        let doc = doc_with_image(&STANDARD.encode(png_bytes()));
        let raster = extract_image(&doc).expect("extract");
        assert_eq!(raster.format, ImageFormat::Png);
        assert_eq!(raster.format_name(), "png");
        assert_eq!((raster.width(), raster.height()), (4, 3));
    }

    #[test]
    fn wrapped_and_data_uri_base64_is_accepted() {
        let b64 = STANDARD.encode(png_bytes());
        let wrapped: String = b64
            .as_bytes()
            .chunks(16)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        let doc = doc_with_image(&format!("data:image/png;base64,{wrapped}"));
        assert!(extract_image(&doc).is_ok());
    }

    #[test]
    fn blank_image_is_missing() {
        let doc = doc_with_image("   ");
        assert!(matches!(
            extract_image(&doc),
            Err(CodecError::MissingImageField)
        ));
        assert!(matches!(
            extract_image(&Document::default()),
            Err(CodecError::MissingImageField)
        ));
    }

    #[test]
    fn bad_base64_is_invalid_encoding() {
        let doc = doc_with_image("not-base64-!!");
        assert!(matches!(
            extract_image(&doc),
            Err(CodecError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn non_image_bytes_are_unsupported() {
        let doc = doc_with_image(&STANDARD.encode(b"just some text, not pixels"));
        assert!(matches!(
            extract_image(&doc),
            Err(CodecError::UnsupportedOrCorruptImage { .. })
        ));
    }

    #[test]
    fn truncated_png_is_corrupt() {
        let mut bytes = png_bytes();
        bytes.truncate(20);
        let doc = doc_with_image(&STANDARD.encode(bytes));
        let err = extract_image(&doc).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedOrCorruptImage { .. }));
        assert!(err.to_string().contains("png"), "got: {err}");
    }
}
