//! Modern-format siblings for existing raster assets.
//!
//! For every jpg/png under a root, `<stem>.webp` and `<stem>.avif` are
//! written next to the source so pages can serve them through `<picture>`.

use std::path::{Path, PathBuf};

use webprep_common::config::WebVariantsConfig;
use webprep_common::size::{BatchTally, SizeChange};

use crate::discovery::{walk_images, VARIANT_SOURCE_EXTENSIONS};
use crate::format::{encode, open_image, EncodeOptions, OutputFormat};
use crate::{display_name, file_size, BatchEvent, ItemOutcome};

/// Generate WebP and AVIF siblings under a directory tree.
#[derive(Debug, Clone)]
pub struct VariantJob {
    pub root: PathBuf,
    pub webp_quality: u8,
    pub avif_quality: u8,
    pub avif_speed: u8,
}

/// Outcomes for one source image (one entry per variant written).
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: PathBuf,
    pub variants: Vec<ItemOutcome>,
}

impl SourceReport {
    pub fn is_success(&self) -> bool {
        self.variants.iter().all(ItemOutcome::is_success)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariantReport {
    pub sources: Vec<SourceReport>,
    /// Counted per variant, not per source.
    pub tally: BatchTally,
}

/// Path of the `format` sibling of `source`.
pub fn sibling_path(source: &Path, format: OutputFormat) -> PathBuf {
    source.with_extension(format.extension())
}

impl VariantJob {
    pub fn from_config(config: &WebVariantsConfig) -> Self {
        Self {
            root: config.root.clone(),
            webp_quality: config.webp_quality,
            avif_quality: config.avif_quality,
            avif_speed: config.avif_speed,
        }
    }

    fn targets(&self) -> [(OutputFormat, EncodeOptions); 2] {
        [
            (
                OutputFormat::WebP,
                EncodeOptions {
                    quality: self.webp_quality,
                    ..EncodeOptions::default()
                },
            ),
            (
                OutputFormat::Avif,
                EncodeOptions {
                    quality: self.avif_quality,
                    avif_speed: self.avif_speed,
                    ..EncodeOptions::default()
                },
            ),
        ]
    }

    /// Walk `root` and write both variants for every source.
    ///
    /// Each source is decoded once. A decode failure fails both of its
    /// variants; an encode failure fails only that variant.
    pub fn run(&self, mut on_event: impl FnMut(BatchEvent)) -> VariantReport {
        let mut report = VariantReport::default();

        let sources = walk_images(&self.root, VARIANT_SOURCE_EXTENSIONS);
        if sources.is_empty() {
            on_event(BatchEvent::FolderEmpty {
                path: self.root.clone(),
            });
            return report;
        }
        on_event(BatchEvent::FolderStarted {
            path: self.root.clone(),
            count: sources.len(),
        });

        let total = sources.len();
        for (i, source) in sources.into_iter().enumerate() {
            on_event(BatchEvent::ItemStarted {
                index: i + 1,
                total,
                name: display_name(&source),
            });

            let decoded = open_image(&source).and_then(|(img, _)| Ok((img, file_size(&source)?)));

            let mut variants = Vec::with_capacity(2);
            for (format, options) in self.targets() {
                let output = sibling_path(&source, format);
                let result = match &decoded {
                    Ok((img, original)) => encode(img, format, &options)
                        .and_then(|bytes| {
                            std::fs::write(&output, &bytes)?;
                            Ok(SizeChange::new(*original, bytes.len() as u64))
                        })
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };

                match &result {
                    Ok(change) => report.tally.record(change),
                    Err(error) => {
                        tracing::warn!(source = %source.display(), ?format, %error, "Variant failed");
                        report.tally.record_failure();
                    }
                }

                let outcome = ItemOutcome {
                    input: source.clone(),
                    output,
                    result,
                };
                on_event(BatchEvent::ItemFinished(outcome.clone()));
                variants.push(outcome);
            }

            report.sources.push(SourceReport { source, variants });
        }

        report
    }
}
