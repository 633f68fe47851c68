//! Thumbnail optimizer: downscale to a maximum width and re-encode.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use webprep_common::config::ThumbnailConfig;
use webprep_common::error::WebprepResult;
use webprep_common::size::{BatchTally, SizeChange};

use crate::discovery::{list_images, IMAGE_EXTENSIONS};
use crate::format::{encode, open_image, EncodeOptions, OutputFormat};
use crate::{ensure_output_dir, file_size, process_items, BatchEvent, ItemOutcome};

/// Dimensions after fitting `width` into `max_width`, keeping aspect ratio.
///
/// Images that already fit are left alone; the new height is truncated and
/// never drops below one pixel.
pub fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let ratio = f64::from(max_width) / f64::from(width);
    let new_height = (f64::from(height) * ratio) as u32;
    (max_width, new_height.max(1))
}

/// Resize (when wider than `max_width`) and recompress one image.
///
/// The encoder is chosen by `output`'s extension. Returns the input and
/// output sizes.
pub fn optimize_image(
    input: &Path,
    output: &Path,
    max_width: Option<u32>,
    options: &EncodeOptions,
) -> WebprepResult<SizeChange> {
    let (mut img, _) = open_image(input)?;
    let original = file_size(input)?;

    if let Some(max_width) = max_width {
        let (w, h) = fit_width(img.width(), img.height(), max_width);
        if (w, h) != (img.width(), img.height()) {
            tracing::trace!(from = ?(img.width(), img.height()), to = ?(w, h), "Downscaling");
            img = img.resize_exact(w, h, FilterType::Lanczos3);
        }
    }

    let bytes = encode(&img, OutputFormat::from_path(output), options)?;
    std::fs::write(output, &bytes)?;

    Ok(SizeChange::new(original, bytes.len() as u64))
}

/// A thumbnail run over several folders.
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    /// Directory `folders` and `output_dir` are relative to.
    pub base_dir: PathBuf,
    /// Source folders; `"."` is `base_dir` itself.
    pub folders: Vec<String>,
    pub output_dir: PathBuf,
    pub max_width: u32,
    pub quality: u8,
    pub format: OutputFormat,
}

/// Results for one source folder.
#[derive(Debug, Clone)]
pub struct FolderReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub items: Vec<ItemOutcome>,
}

/// Results of a whole thumbnail run.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailReport {
    pub folders: Vec<FolderReport>,
    pub tally: BatchTally,
}

impl ThumbnailJob {
    pub fn from_config(config: &ThumbnailConfig) -> WebprepResult<Self> {
        Ok(Self {
            base_dir: config.base_dir.clone(),
            folders: config.folders.clone(),
            output_dir: config.output_dir.clone(),
            max_width: config.max_width,
            quality: config.quality,
            format: OutputFormat::from_name(&config.format)?,
        })
    }

    /// Where thumbnails from `folder` are written.
    pub fn output_dir_for(&self, folder: &str) -> PathBuf {
        let root = self.base_dir.join(&self.output_dir);
        if folder == "." {
            root
        } else {
            root.join(folder)
        }
    }

    /// Where images for `folder` are read from.
    pub fn source_dir_for(&self, folder: &str) -> PathBuf {
        if folder == "." {
            self.base_dir.clone()
        } else {
            self.base_dir.join(folder)
        }
    }

    /// Process every folder. Per-item failures are recorded, never returned.
    pub fn run(&self, mut on_event: impl FnMut(BatchEvent)) -> ThumbnailReport {
        let options = EncodeOptions::with_quality(self.quality);
        let mut report = ThumbnailReport::default();

        tracing::info!(
            folders = self.folders.len(),
            max_width = self.max_width,
            format = ?self.format,
            "Generating thumbnails"
        );

        for folder in &self.folders {
            let source = self.source_dir_for(folder);
            let output = self.output_dir_for(folder);

            if !ensure_output_dir(&output, &mut on_event) {
                continue;
            }

            let images = list_images(&source, IMAGE_EXTENSIONS);
            if images.is_empty() {
                on_event(BatchEvent::FolderEmpty {
                    path: source.clone(),
                });
                continue;
            }

            on_event(BatchEvent::FolderStarted {
                path: source.clone(),
                count: images.len(),
            });

            let ext = self.format.extension();
            let pairs = images
                .into_iter()
                .map(|input| {
                    let mut name = input
                        .file_stem()
                        .map(|s| s.to_os_string())
                        .unwrap_or_default();
                    name.push(".");
                    name.push(ext);
                    let target = output.join(name);
                    (input, target)
                })
                .collect();

            let items = process_items(pairs, &mut report.tally, &mut on_event, |input, target| {
                optimize_image(input, target, Some(self.max_width), &options)
            });

            report.folders.push(FolderReport {
                source,
                output,
                items,
            });
        }

        tracing::info!(
            processed = report.tally.processed,
            failed = report.tally.failed,
            "Thumbnail run finished"
        );
        report
    }
}
