//! Fixed-factor resizer.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use webprep_common::config::ResizeConfig;
use webprep_common::error::{WebprepError, WebprepResult};
use webprep_common::size::{BatchTally, SizeChange};

use crate::discovery::{list_images, RESIZE_EXTENSIONS};
use crate::format::{encode_as, open_image};
use crate::{ensure_output_dir, file_size, process_items, BatchEvent, ItemOutcome};

/// Both dimensions multiplied by `scale` and truncated, never below 1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (f64::from(width) * scale) as u32;
    let h = (f64::from(height) * scale) as u32;
    (w.max(1), h.max(1))
}

/// Resize one image by `scale`, writing it in the container it was decoded
/// from. Returns the new dimensions.
pub fn resize_image(input: &Path, output: &Path, scale: f64) -> WebprepResult<(u32, u32)> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(WebprepError::config(format!(
            "Scale must be a positive number, got {scale}"
        )));
    }

    let (img, format) = open_image(input)?;
    let (w, h) = scaled_dimensions(img.width(), img.height(), scale);
    let resized = img.resize_exact(w, h, FilterType::CatmullRom);

    let bytes = encode_as(&resized, format)?;
    std::fs::write(output, bytes)?;
    Ok((w, h))
}

/// Resize every image in one folder into another.
#[derive(Debug, Clone)]
pub struct ResizeJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub scale: f64,
}

/// Results of a resize run.
#[derive(Debug, Clone, Default)]
pub struct ResizeReport {
    pub items: Vec<ItemOutcome>,
    pub tally: BatchTally,
}

impl ResizeJob {
    pub fn from_config(config: &ResizeConfig) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            scale: config.scale,
        }
    }

    /// Resize every matching file, keeping file names.
    pub fn run(&self, mut on_event: impl FnMut(BatchEvent)) -> ResizeReport {
        let mut report = ResizeReport::default();

        tracing::info!(
            input = %self.input_dir.display(),
            output = %self.output_dir.display(),
            scale = self.scale,
            "Resizing images"
        );

        if !ensure_output_dir(&self.output_dir, &mut on_event) {
            return report;
        }

        let images = list_images(&self.input_dir, RESIZE_EXTENSIONS);
        if images.is_empty() {
            on_event(BatchEvent::FolderEmpty {
                path: self.input_dir.clone(),
            });
            return report;
        }
        on_event(BatchEvent::FolderStarted {
            path: self.input_dir.clone(),
            count: images.len(),
        });

        let pairs = images
            .into_iter()
            .filter_map(|input| {
                let name = input.file_name()?.to_os_string();
                Some((input, self.output_dir.join(name)))
            })
            .collect();

        report.items = process_items(pairs, &mut report.tally, &mut on_event, |input, output| {
            let original = file_size(input)?;
            resize_image(input, output, self.scale)?;
            Ok(SizeChange::new(original, file_size(output)?))
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_scale() {
        assert_eq!(scaled_dimensions(1920, 1080, 0.3), (576, 324));
    }

    #[test]
    fn test_truncates_fractions() {
        // 333 * 0.3 = 99.9
        assert_eq!(scaled_dimensions(333, 10, 0.3), (99, 3));
    }

    #[test]
    fn test_clamps_to_one_pixel() {
        assert_eq!(scaled_dimensions(2, 2, 0.1), (1, 1));
    }

    #[test]
    fn test_upscale() {
        assert_eq!(scaled_dimensions(10, 20, 2.0), (20, 40));
    }

    proptest! {
        #[test]
        fn prop_scaled_dimensions_track_ratio(
            w in 1u32..10_000,
            h in 1u32..10_000,
            scale in 0.01f64..4.0,
        ) {
            let (nw, nh) = scaled_dimensions(w, h, scale);
            prop_assert!(nw >= 1 && nh >= 1);
            prop_assert!((nw as f64) <= (w as f64 * scale).max(1.0));
            prop_assert!((nw as f64) > w as f64 * scale - 1.0);
            prop_assert!((nh as f64) <= (h as f64 * scale).max(1.0));
            prop_assert!((nh as f64) > h as f64 * scale - 1.0);
        }
    }
}
