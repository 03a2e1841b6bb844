//! End-to-end tests for images2docx.
//!
//! Fixtures are generated in memory with the `image` crate, so these run
//! without any files on disk or system libraries. Every produced `.docx` is
//! opened again with `zip` and inspected part by part.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use futures::StreamExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use images2docx::{
    convert, convert_to_file, normalize_stream, ConversionConfig, ConversionStats,
    EmptyBatchPolicy, Footprint, Images2DocxError, ProgressState, ProgressTracker, RawImageInput,
};
use std::io::{Cursor, Read};

// ── Test helpers ─────────────────────────────────────────────────────────────

const EMU_PER_PIXEL: u64 = 9525;

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A solid-colour image encoded as `format`.
fn solid(w: u32, h: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// Distinct colours so media order can be checked after recompression.
const PALETTE: [[u8; 3]; 7] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [0, 255, 255],
    [255, 0, 255],
    [0, 0, 0],
];

/// Seven photos of mixed formats and aspect ratios.
fn seven_photos() -> Vec<RawImageInput> {
    PALETTE
        .iter()
        .enumerate()
        .map(|(i, rgb)| {
            let (w, h) = if i % 2 == 0 { (1200, 900) } else { (300, 640) };
            if i % 3 == 0 {
                RawImageInput::new(
                    format!("photo{i}.jpg"),
                    "image/jpeg",
                    solid(w, h, *rgb, ImageFormat::Jpeg),
                )
            } else {
                RawImageInput::new(
                    format!("photo{i}.png"),
                    "image/png",
                    solid(w, h, *rgb, ImageFormat::Png),
                )
            }
        })
        .collect()
}

fn read_entry(docx: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing part {name}"));
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

fn document_xml(docx: &[u8]) -> String {
    String::from_utf8(read_entry(docx, "word/document.xml")).unwrap()
}

/// Per-row `(cells, pictures)` counts from `word/document.xml`.
fn row_shapes(xml: &str) -> Vec<(usize, usize)> {
    xml.split("<w:tr>")
        .skip(1)
        .map(|row| {
            let row = row.split("</w:tr>").next().unwrap_or("");
            (row.matches("<w:tc>").count(), row.matches("<a:blip ").count())
        })
        .collect()
}

fn assert_close(actual: [u8; 3], expected: [u8; 3], context: &str) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (i16::from(*a) - i16::from(*e)).abs() <= 16,
            "[{context}] colour {actual:?} too far from {expected:?}"
        );
    }
}

// ── Grid shape ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn seven_photos_fill_three_rows_with_padded_tail() {
    init_tracing();
    let out = convert(seven_photos(), &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.stats.images, 7);
    assert_eq!(out.stats.rows, 3);

    let xml = document_xml(&out.document.bytes);
    assert_eq!(xml.matches("<w:tbl>").count(), 1);
    assert_eq!(row_shapes(&xml), vec![(3, 3), (3, 3), (3, 1)]);
}

#[tokio::test]
async fn exact_multiple_has_no_padding() {
    let files: Vec<_> = seven_photos().into_iter().take(6).collect();
    let out = convert(files, &ConversionConfig::default()).await.unwrap();
    let xml = document_xml(&out.document.bytes);
    assert_eq!(row_shapes(&xml), vec![(3, 3), (3, 3)]);
}

#[tokio::test]
async fn configured_column_count_is_respected() {
    let config = ConversionConfig::builder().columns(4).build().unwrap();
    let out = convert(seven_photos(), &config).await.unwrap();
    let xml = document_xml(&out.document.bytes);
    assert_eq!(row_shapes(&xml), vec![(4, 4), (4, 3)]);
}

// ── Image content ────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_picture_is_stamped_with_the_footprint() {
    let config = ConversionConfig::builder()
        .footprint(Footprint::new(200, 100))
        .build()
        .unwrap();
    let out = convert(seven_photos(), &config).await.unwrap();

    let xml = document_xml(&out.document.bytes);
    let extent = format!(
        r#"<wp:extent cx="{}" cy="{}"/>"#,
        200 * EMU_PER_PIXEL,
        100 * EMU_PER_PIXEL
    );
    assert_eq!(xml.matches(extent.as_str()).count(), 7);
}

#[tokio::test]
async fn media_is_bounded_jpeg_in_input_order() {
    let out = convert(seven_photos(), &ConversionConfig::default())
        .await
        .unwrap();

    for (i, expected) in PALETTE.iter().enumerate() {
        let name = format!("word/media/image{}.jpeg", i + 1);
        let media = read_entry(&out.document.bytes, &name);
        assert_eq!(image::guess_format(&media).unwrap(), ImageFormat::Jpeg);

        let decoded = image::load_from_memory(&media).unwrap();
        assert!(decoded.width().max(decoded.height()) <= 800, "{name} too large");
        let centre = decoded
            .to_rgb8()
            .get_pixel(decoded.width() / 2, decoded.height() / 2)
            .0;
        assert_close(centre, *expected, &name);
    }
}

#[tokio::test]
async fn downscale_keeps_aspect_ratio() {
    let files = vec![RawImageInput::new(
        "wide.png",
        "image/png",
        solid(1600, 400, [10, 20, 30], ImageFormat::Png),
    )];
    let out = convert(files, &ConversionConfig::default()).await.unwrap();
    let media = read_entry(&out.document.bytes, "word/media/image1.jpeg");
    let decoded = image::load_from_memory(&media).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (800, 200));
}

// ── Failure handling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn corrupt_file_aborts_batch_and_is_named() {
    init_tracing();
    let tracker = ProgressTracker::new();
    let config = ConversionConfig::builder()
        .progress_tracker(tracker.clone())
        .build()
        .unwrap();

    let mut files = seven_photos();
    files[2] = RawImageInput::new("scan_003.jpg", "image/jpeg", b"not a jpeg".to_vec());

    let err = convert(files, &config).await.unwrap_err();
    assert!(matches!(err, Images2DocxError::RenderFailed { .. }));
    assert_eq!(err.file_name(), Some("scan_003.jpg"));
    assert!(err.to_string().contains("scan_003.jpg"));
    assert_eq!(tracker.snapshot(), ProgressState::IDLE);
}

#[tokio::test]
async fn progress_tracker_ends_idle_after_success() {
    let tracker = ProgressTracker::new();
    let mut rx = tracker.subscribe();
    let config = ConversionConfig::builder()
        .progress_tracker(tracker.clone())
        .build()
        .unwrap();

    convert(seven_photos(), &config).await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_idle());
    assert!(tracker.snapshot().is_idle());
}

// ── Empty batch ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_batch_produces_valid_document_without_table() {
    let out = convert(Vec::new(), &ConversionConfig::default())
        .await
        .unwrap();
    let xml = document_xml(&out.document.bytes);
    assert!(!xml.contains("<w:tbl>"));
    assert!(xml.contains("<w:sectPr>"));
}

#[tokio::test]
async fn empty_batch_can_be_rejected() {
    let config = ConversionConfig::builder()
        .empty_batch(EmptyBatchPolicy::Reject)
        .build()
        .unwrap();
    let err = convert(Vec::new(), &config).await.unwrap_err();
    assert!(matches!(err, Images2DocxError::EmptyBatch));
}

// ── Determinism & file output ────────────────────────────────────────────────

#[tokio::test]
async fn same_inputs_give_identical_documents() {
    let config = ConversionConfig::default();
    let a = convert(seven_photos(), &config).await.unwrap();
    let b = convert(seven_photos(), &config).await.unwrap();
    assert_eq!(a.document.bytes, b.document.bytes);
}

#[tokio::test]
async fn convert_to_file_reads_paths_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for (i, rgb) in PALETTE.iter().take(4).enumerate() {
        let p = dir.path().join(format!("{i}.png"));
        std::fs::write(&p, solid(64, 48, *rgb, ImageFormat::Png)).unwrap();
        paths.push(p);
    }
    // A PNG with an iPhone-style name goes through the HEIC route first.
    let odd = dir.path().join("IMG_0004.HEIC");
    std::fs::write(&odd, solid(64, 48, [128, 128, 128], ImageFormat::Png)).unwrap();
    paths.push(odd);

    let target = dir.path().join("images.docx");
    let stats = convert_to_file(&paths, &target, &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(stats.images, 5);
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.fallbacks, 1);

    let bytes = std::fs::read(&target).unwrap();
    let media = read_entry(&bytes, "word/media/image2.jpeg");
    let centre = image::load_from_memory(&media).unwrap().to_rgb8().get_pixel(32, 24).0;
    assert_close(centre, PALETTE[1], "image2");
}

#[tokio::test]
async fn missing_path_fails_before_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("images.docx");
    let err = convert_to_file(
        &[dir.path().join("nope.jpg")],
        &target,
        &ConversionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Images2DocxError::FileNotFound { .. }));
    assert!(!target.exists());
}

#[test]
fn stats_serialise_to_json() {
    let out = tokio_test::block_on(convert(seven_photos(), &ConversionConfig::default())).unwrap();

    let json = serde_json::to_string_pretty(&out.stats).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["images"], 7);
    assert_eq!(value["rows"], 3);
    assert_eq!(value["columns"], 3);
    assert_eq!(value["document_bytes"], out.document.len() as u64);

    let back: ConversionStats = serde_json::from_str(&json).unwrap();
    assert_eq!(back.rows, out.stats.rows);
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_one_image_per_input() {
    let images: Vec<_> = normalize_stream(seven_photos(), &ConversionConfig::default())
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(images.len(), 7);
    assert!(images
        .iter()
        .all(|img| img.display_width == 128 && img.display_height == 170));
}
