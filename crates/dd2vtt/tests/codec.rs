//! Behavioural tests for the DD2VTT codec over real encoded images.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dd2vtt::{describe, export_to_file, extract_image, parse, CodecError, ImageFormat};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A small image with distinct pixels so pixel comparisons are meaningful.
fn gradient() -> DynamicImage {
    let img = RgbaImage::from_fn(16, 9, |x, y| Rgba([(x * 15) as u8, (y * 28) as u8, 128, 255]));
    DynamicImage::ImageRgba8(img)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

fn dd2vtt_json(image_b64: &str, with_resolution: bool) -> Vec<u8> {
    let mut doc = serde_json::json!({ "format": 0.3, "image": image_b64 });
    if with_resolution {
        doc["resolution"] = serde_json::json!({
            "map_origin": { "x": 0, "y": 0 },
            "map_size": { "x": 16, "y": 9 },
            "pixels_per_grid": 1
        });
    }
    serde_json::to_vec(&doc).unwrap()
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[test]
fn embedded_png_round_trips_pixel_identical() {
    let original = gradient();
    let raw = dd2vtt_json(&STANDARD.encode(encode(&original, ImageFormat::Png)), true);

    let doc = parse(&raw).expect("parse");
    let raster = extract_image(&doc).expect("extract");

    assert_eq!(raster.format, ImageFormat::Png);
    assert_eq!(raster.image.to_rgba8().as_raw(), original.to_rgba8().as_raw());
}

#[test]
fn extraction_works_without_resolution_block() {
    let raw = dd2vtt_json(&STANDARD.encode(encode(&gradient(), ImageFormat::Png)), false);
    let doc = parse(&raw).unwrap();

    assert!(extract_image(&doc).is_ok());
    let info = describe(&doc);
    assert_eq!(info.grid_width, None);
    assert_eq!(info.grid_height, None);
    assert_eq!(info.pixels_per_grid, None);
}

#[test]
fn malformed_json_fails_parse() {
    let err = parse(b"{not json").unwrap_err();
    assert!(matches!(err, CodecError::MalformedDocument { .. }), "got: {err:?}");
}

#[test]
fn bad_base64_fails_extract_but_describe_still_works() {
    let raw = br#"{"image":"not-base64-!!","resolution":{"map_size":{"x":30,"y":20},"pixels_per_grid":256}}"#;
    let doc = parse(raw).unwrap();

    let err = extract_image(&doc).unwrap_err();
    assert!(matches!(err, CodecError::InvalidEncoding { .. }), "got: {err:?}");

    let info = describe(&doc);
    assert_eq!(info.grid_label(), "30x20");
    assert_eq!(info.pixels_per_grid, Some(256));
}

#[test]
fn missing_image_is_distinct_from_bad_encoding() {
    let doc = parse(br#"{"resolution":{"pixels_per_grid":100}}"#).unwrap();
    assert!(matches!(extract_image(&doc), Err(CodecError::MissingImageField)));

    let doc = parse(br#"{"image":""}"#).unwrap();
    assert!(matches!(extract_image(&doc), Err(CodecError::MissingImageField)));
}

#[test]
fn jpeg_payload_reports_real_format() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 12, Rgb([40, 90, 160])));
    let raw = dd2vtt_json(&STANDARD.encode(encode(&img, ImageFormat::Jpeg)), true);

    let raster = extract_image(&parse(&raw).unwrap()).unwrap();
    assert_eq!(raster.format, ImageFormat::Jpeg);
    assert_eq!((raster.width(), raster.height()), (12, 12));
}

// ── Export ───────────────────────────────────────────────────────────────────

#[test]
fn export_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("map.png");
    let raw = dd2vtt_json(&STANDARD.encode(encode(&gradient(), ImageFormat::Png)), true);
    let doc = parse(&raw).unwrap();

    export_to_file(&doc, &dest).expect("first export");
    let first = std::fs::read(&dest).unwrap();
    export_to_file(&doc, &dest).expect("second export");
    let second = std::fs::read(&dest).unwrap();

    assert_eq!(first, second);
}

#[test]
fn png_export_keeps_embedded_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("map.png");
    let png = encode(&gradient(), ImageFormat::Png);
    let doc = parse(&dd2vtt_json(&STANDARD.encode(&png), false)).unwrap();

    let written = export_to_file(&doc, &dest).unwrap();
    assert_eq!(written, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), png);
}

#[test]
fn jpeg_export_is_written_as_png() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("map.png");
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 6, Rgb([1, 2, 3])));
    let doc = parse(&dd2vtt_json(&STANDARD.encode(encode(&img, ImageFormat::Jpeg)), false)).unwrap();

    export_to_file(&doc, &dest).unwrap();
    let bytes = std::fs::read(&dest).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    let reread = image::load_from_memory(&bytes).unwrap();
    assert_eq!((reread.width(), reread.height()), (10, 6));
}

#[test]
fn export_propagates_extraction_errors() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("map.png");
    let doc = parse(br#"{"image":"not-base64-!!"}"#).unwrap();

    assert!(matches!(
        export_to_file(&doc, &dest),
        Err(CodecError::InvalidEncoding { .. })
    ));
    assert!(!dest.exists());
}
