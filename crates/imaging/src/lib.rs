//! Webprep Imaging
//!
//! Batch image tools for preparing web assets:
//!
//! - **Thumbnails:** scale folders of images down to a maximum width and
//!   re-encode them (WebP by default) into a mirrored output tree.
//! - **Resize:** shrink every image in a folder by a fixed factor, keeping
//!   each file's original format.
//! - **Variants:** write `.webp` and `.avif` siblings next to every jpg/png
//!   under a directory tree.
//!
//! Every batch runs item by item. A file that fails to decode or encode is
//! reported through its [`ItemOutcome`] and the batch moves on.

pub mod discovery;
pub mod format;
pub mod optimize;
pub mod resize;
pub mod variants;

use std::path::{Path, PathBuf};

use webprep_common::size::{BatchTally, SizeChange};
use webprep_common::WebprepResult;

pub use format::{probe_encoder, EncodeOptions, OutputFormat};
pub use optimize::{optimize_image, ThumbnailJob, ThumbnailReport};
pub use resize::{resize_image, ResizeJob, ResizeReport};
pub use variants::{VariantJob, VariantReport};

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Size change on success, error message on failure.
    pub result: Result<SizeChange, String>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// File name of the input, for display.
    pub fn name(&self) -> String {
        display_name(&self.input)
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// An output directory did not exist and was created.
    FolderCreated { path: PathBuf },
    /// An output directory could not be created; its folder is skipped.
    FolderFailed { path: PathBuf, error: String },
    /// A source folder contained no matching images.
    FolderEmpty { path: PathBuf },
    /// A source folder is about to be processed.
    FolderStarted { path: PathBuf, count: usize },
    /// Processing of an item begins (`index` is 1-based).
    ItemStarted {
        index: usize,
        total: usize,
        name: String,
    },
    ItemFinished(ItemOutcome),
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Create `dir` if needed, reporting creation or failure as an event.
/// Returns false when the directory is unusable.
pub(crate) fn ensure_output_dir(dir: &Path, on_event: &mut dyn FnMut(BatchEvent)) -> bool {
    if dir.is_dir() {
        return true;
    }
    match std::fs::create_dir_all(dir) {
        Ok(()) => {
            tracing::debug!(path = %dir.display(), "Created output folder");
            on_event(BatchEvent::FolderCreated {
                path: dir.to_path_buf(),
            });
            true
        }
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Cannot create output folder");
            on_event(BatchEvent::FolderFailed {
                path: dir.to_path_buf(),
                error: e.to_string(),
            });
            false
        }
    }
}

/// Run `convert` over `(input, output)` pairs, isolating per-item failures.
pub(crate) fn process_items<F>(
    items: Vec<(PathBuf, PathBuf)>,
    tally: &mut BatchTally,
    on_event: &mut dyn FnMut(BatchEvent),
    mut convert: F,
) -> Vec<ItemOutcome>
where
    F: FnMut(&Path, &Path) -> WebprepResult<SizeChange>,
{
    let total = items.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, (input, output)) in items.into_iter().enumerate() {
        on_event(BatchEvent::ItemStarted {
            index: i + 1,
            total,
            name: display_name(&input),
        });

        let result = match convert(&input, &output) {
            Ok(change) => {
                tally.record(&change);
                tracing::debug!(
                    input = %input.display(),
                    original = change.original,
                    new = change.new,
                    "Converted"
                );
                Ok(change)
            }
            Err(e) => {
                tally.record_failure();
                tracing::warn!(input = %input.display(), error = %e, "Conversion failed");
                Err(e.to_string())
            }
        };

        let outcome = ItemOutcome {
            input,
            output,
            result,
        };
        on_event(BatchEvent::ItemFinished(outcome.clone()));
        outcomes.push(outcome);
    }

    outcomes
}

/// Size of a file on disk.
pub(crate) fn file_size(path: &Path) -> WebprepResult<u64> {
    Ok(std::fs::metadata(path)?.len())
}
