use dupsweep::actions::{preview_file, PreviewConfig, PreviewKind};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_text_preview_first_twenty_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    let body: Vec<String> = (1..=30).map(|i| format!("line {i}")).collect();
    fs::write(&path, body.join("\n")).unwrap();

    let preview = preview_file(&path, &PreviewConfig::default());

    assert_eq!(preview.kind, PreviewKind::Text);
    assert_eq!(preview.content.lines().count(), 20);
    assert!(preview.content.starts_with("line 1\n"));
    assert!(preview.content.ends_with("line 20"));
    assert_eq!(preview.path, path);
}

#[test]
fn test_small_image_is_embedded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pixel.png");
    image::RgbImage::new(4, 4).save(&path).unwrap();

    let preview = preview_file(&path, &PreviewConfig::default());

    assert_eq!(preview.kind, PreviewKind::Image);
    assert!(preview.content.starts_with("data:image/png;base64,"));
}

#[test]
fn test_large_image_is_thumbnailed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.png");
    image::RgbImage::from_pixel(64, 32, image::Rgb([200, 10, 10]))
        .save(&path)
        .unwrap();

    let config = PreviewConfig {
        max_image_bytes: 1,
        thumbnail_size: 8,
        ..Default::default()
    };
    let preview = preview_file(&path, &config);

    assert_eq!(preview.kind, PreviewKind::Image);
    assert!(preview.content.starts_with("data:image/png;base64,"));
}

#[test]
fn test_binary_and_missing_are_unsupported() {
    let dir = tempdir().unwrap();
    let blob = dir.path().join("blob.dat");
    fs::write(&blob, [0u8, 159, 146, 150, 0, 1]).unwrap();

    let preview = preview_file(&blob, &PreviewConfig::default());
    assert_eq!(preview.kind, PreviewKind::Unsupported);

    let missing = preview_file(&dir.path().join("nope.txt"), &PreviewConfig::default());
    assert_eq!(missing.kind, PreviewKind::Unsupported);
    assert!(missing.content.contains("not found"));
}

#[test]
fn test_extensionless_text_is_sniffed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("README");
    fs::write(&path, "plain words\nsecond line").unwrap();

    let preview = preview_file(&path, &PreviewConfig::default());
    assert_eq!(preview.kind, PreviewKind::Text);
    assert_eq!(preview.content, "plain words\nsecond line");
}
