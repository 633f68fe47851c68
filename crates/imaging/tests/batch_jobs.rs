use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use webprep_imaging::{BatchEvent, OutputFormat, ResizeJob, ThumbnailJob, VariantJob};

fn write_rgb(path: &Path, width: u32, height: u32, format: ImageFormat) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save_with_format(path, format).unwrap();
}

fn write_rgba_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, 40, (y % 256) as u8, 128])
    });
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

fn sniff(path: &Path) -> ImageFormat {
    let bytes = std::fs::read(path).unwrap();
    image::guess_format(&bytes).unwrap()
}

#[test]
fn thumbnails_mirror_folders_and_isolate_bad_files() {
    let site = tempfile::tempdir().unwrap();
    let base = site.path();
    std::fs::create_dir(base.join("screenshots")).unwrap();

    write_rgb(&base.join("hero.jpg"), 800, 600, ImageFormat::Jpeg);
    write_rgba_png(&base.join("logo.png"), 120, 60);
    std::fs::write(base.join("broken.png"), b"definitely not a png").unwrap();
    write_rgb(&base.join("screenshots").join("app.v2.png"), 1000, 250, ImageFormat::Png);

    let job = ThumbnailJob {
        base_dir: base.to_path_buf(),
        folders: vec![".".into(), "screenshots".into(), "missing".into()],
        output_dir: PathBuf::from("thumbs"),
        max_width: 400,
        quality: 75,
        format: OutputFormat::WebP,
    };

    let mut events = Vec::new();
    let report = job.run(|event| events.push(event));

    // hero, logo, app converted; broken failed.
    assert_eq!(report.tally.processed, 3);
    assert_eq!(report.tally.failed, 1);
    assert_eq!(report.folders.len(), 2);

    let thumbs = base.join("thumbs");
    assert_eq!(dimensions(&thumbs.join("hero.webp")), (400, 300));
    assert_eq!(dimensions(&thumbs.join("logo.webp")), (120, 60));
    assert_eq!(
        dimensions(&thumbs.join("screenshots").join("app.v2.webp")),
        (400, 100)
    );
    assert_eq!(sniff(&thumbs.join("hero.webp")), ImageFormat::WebP);
    assert!(!thumbs.join("broken.webp").exists());

    let expected_original: u64 = ["hero.jpg", "logo.png"]
        .iter()
        .map(|n| std::fs::metadata(base.join(n)).unwrap().len())
        .sum::<u64>()
        + std::fs::metadata(base.join("screenshots").join("app.v2.png"))
            .unwrap()
            .len();
    assert_eq!(report.tally.total_original, expected_original);

    let expected_new: u64 = report
        .folders
        .iter()
        .flat_map(|f| f.items.iter())
        .filter_map(|item| item.result.as_ref().ok())
        .map(|change| change.new)
        .sum();
    assert_eq!(report.tally.total_new, expected_new);

    assert!(events
        .iter()
        .any(|e| matches!(e, BatchEvent::FolderEmpty { path } if path.ends_with("missing"))));
    assert!(events
        .iter()
        .any(|e| matches!(e, BatchEvent::FolderCreated { path } if path.ends_with("screenshots"))));
    assert!(events.iter().any(|e| matches!(
        e,
        BatchEvent::ItemFinished(outcome) if outcome.name() == "broken.png" && !outcome.is_success()
    )));
}

#[test]
fn thumbnails_honour_requested_format() {
    let site = tempfile::tempdir().unwrap();
    write_rgba_png(&site.path().join("badge.png"), 64, 64);

    for (format, expected) in [
        (OutputFormat::Jpeg, ImageFormat::Jpeg),
        (OutputFormat::Png, ImageFormat::Png),
    ] {
        let job = ThumbnailJob {
            base_dir: site.path().to_path_buf(),
            folders: vec![".".into()],
            output_dir: PathBuf::from(format!("out-{}", format.extension())),
            max_width: 32,
            quality: 80,
            format,
        };
        let report = job.run(|_| {});
        assert_eq!(report.tally.processed, 1);

        let output = &report.folders[0].items[0].output;
        assert_eq!(output.extension().unwrap(), format.extension());
        assert_eq!(sniff(output), expected);
        assert_eq!(dimensions(output), (32, 32));
    }
}

#[test]
fn resize_keeps_names_and_formats() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("screenshots");
    let output = dir.path().join("resized_images");
    std::fs::create_dir(&input).unwrap();

    write_rgb(&input.join("wide.png"), 1000, 500, ImageFormat::Png);
    write_rgb(&input.join("photo.jpg"), 333, 100, ImageFormat::Jpeg);
    write_rgb(&input.join("banner.webp"), 400, 200, ImageFormat::WebP);
    // Extension says PNG, content is JPEG: output follows the content.
    write_rgb(&input.join("liar.png"), 100, 100, ImageFormat::Jpeg);
    std::fs::write(input.join("anim.gif"), b"GIF89a").unwrap();

    let job = ResizeJob {
        input_dir: input.clone(),
        output_dir: output.clone(),
        scale: 0.3,
    };
    let report = job.run(|_| {});

    assert_eq!(report.tally.processed, 4);
    assert_eq!(report.tally.failed, 0);
    assert_eq!(dimensions(&output.join("wide.png")), (300, 150));
    assert_eq!(dimensions(&output.join("banner.webp")), (120, 60));
    assert_eq!(sniff(&output.join("banner.webp")), ImageFormat::WebP);
    // Re-encoded lossy (VP8), not lossless (VP8L).
    let webp = std::fs::read(output.join("banner.webp")).unwrap();
    assert!(webp.windows(4).any(|w| w == b"VP8 "));
    assert!(!webp.windows(4).any(|w| w == b"VP8L"));
    assert_eq!(dimensions(&output.join("photo.jpg")), (99, 30));
    assert_eq!(sniff(&output.join("photo.jpg")), ImageFormat::Jpeg);
    assert_eq!(sniff(&output.join("liar.png")), ImageFormat::Jpeg);
    assert!(!output.join("anim.gif").exists());
}

#[test]
fn resize_reports_missing_input_folder() {
    let dir = tempfile::tempdir().unwrap();
    let job = ResizeJob {
        input_dir: dir.path().join("nowhere"),
        output_dir: dir.path().join("out"),
        scale: 0.5,
    };
    let mut events = Vec::new();
    let report = job.run(|e| events.push(e));

    assert!(report.items.is_empty());
    assert_eq!(report.tally.attempted(), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, BatchEvent::FolderEmpty { .. })));
}

#[test]
fn variants_written_next_to_sources() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("projects");
    std::fs::create_dir(&nested).unwrap();
    write_rgb(&dir.path().join("cover.jpg"), 24, 16, ImageFormat::Jpeg);
    write_rgba_png(&nested.join("icon.png"), 16, 16);
    std::fs::write(nested.join("corrupt.jpg"), b"\xFF\xD8garbage").unwrap();

    let job = VariantJob {
        root: dir.path().to_path_buf(),
        webp_quality: 80,
        avif_quality: 70,
        avif_speed: 10,
    };
    let report = job.run(|_| {});

    assert_eq!(report.sources.len(), 3);
    assert_eq!(report.tally.processed, 4);
    assert_eq!(report.tally.failed, 2);

    assert_eq!(sniff(&dir.path().join("cover.webp")), ImageFormat::WebP);
    assert_eq!(sniff(&nested.join("icon.webp")), ImageFormat::WebP);
    assert!(dir.path().join("cover.avif").exists());
    assert!(nested.join("icon.avif").exists());
    assert!(!nested.join("corrupt.webp").exists());

    let corrupt = report
        .sources
        .iter()
        .find(|s| s.source.ends_with("corrupt.jpg"))
        .unwrap();
    assert!(!corrupt.is_success());
}
